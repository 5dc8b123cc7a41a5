//! Stderr logger for the `log` facade
//!
//! Level comes from `--log-level`, then `RELOCK_LOG`, then defaults to `warn`.

use anyhow::Context;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::str::FromStr;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

struct StderrLogger {
    level: LevelFilter,
    color: ColorChoice,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut stderr = StandardStream::stderr(self.color);
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(level_color(record.level()))).set_bold(true);
        let _ = stderr.set_color(&spec);
        let _ = write!(stderr, "{:<5}", record.level());
        let _ = stderr.reset();
        let thread = std::thread::current();
        let _ = writeln!(
            stderr,
            " [{}] {}: {}",
            thread.name().unwrap_or("-"),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Cyan,
        Level::Trace => Color::Magenta,
    }
}

/// Resolve the level filter from the CLI flag and `RELOCK_LOG`.
fn resolve_level(flag: Option<&str>) -> anyhow::Result<LevelFilter> {
    let env = std::env::var("RELOCK_LOG").ok();
    match flag.or(env.as_deref()) {
        Some(value) => LevelFilter::from_str(value.trim())
            .with_context(|| format!("invalid log level '{}'", value)),
        None => Ok(DEFAULT_LEVEL),
    }
}

/// Install the logger. Call once, before any threads are spawned.
pub fn init(flag: Option<&str>, color: ColorChoice) -> anyhow::Result<()> {
    let level = resolve_level(flag)?;
    log::set_boxed_logger(Box::new(StderrLogger { level, color }))
        .context("logger already installed")?;
    log::set_max_level(level);
    Ok(())
}

//! Relock CLI tool
//!
//! Drives the process-wide reentrant lock from several threads: a narrated
//! demo of nested acquisition and a stress run that checks exclusion.

mod commands;
mod logger;
mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relock")]
#[command(about = "Reentrant lock demo and stress driver", long_about = None)]
#[command(version)]
struct Cli {
    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    /// Log level: off, error, warn, info, debug, trace (overrides RELOCK_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Threads take the shared lock in turn, re-entering while they hold it
    Demo {
        /// Number of competing threads
        #[arg(short, long, default_value_t = 2)]
        threads: usize,
        /// Time each thread keeps the lock, in milliseconds
        #[arg(long, default_value_t = 500)]
        hold_ms: u64,
        /// Nested acquisitions taken while holding the lock
        #[arg(short, long, default_value_t = 1)]
        depth: u32,
    },

    /// Hammer the shared lock and verify mutual exclusion
    Stress {
        /// Number of competing threads (default: number of CPUs)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Critical sections entered per thread
        #[arg(short, long, default_value_t = 10_000)]
        iterations: u64,
        /// Nesting depth of each critical section
        #[arg(short, long, default_value_t = 1)]
        depth: u32,
    },

    /// Show version and environment info
    Info,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let color = output::resolve_color_choice(cli.color.as_deref());
    logger::init(cli.log_level.as_deref(), color)?;

    match cli.command {
        Commands::Demo {
            threads,
            hold_ms,
            depth,
        } => commands::demo::execute(
            &commands::demo::DemoConfig {
                threads,
                hold: std::time::Duration::from_millis(hold_ms),
                depth,
            },
            color,
        ),

        Commands::Stress {
            threads,
            iterations,
            depth,
        } => commands::stress::execute(
            &commands::stress::StressConfig {
                threads: threads.unwrap_or_else(num_cpus::get),
                iterations,
                depth,
            },
            color,
        ),

        Commands::Info => commands::info::execute(),
    }
}

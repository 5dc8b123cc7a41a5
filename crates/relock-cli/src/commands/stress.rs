//! `relock stress` — Hammer the shared lock and check exclusion.

use crate::output::StyledOutput;
use anyhow::Context;
use relock_core::{exclusive_lock, ReentrantLock};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use termcolor::ColorChoice;

pub struct StressConfig {
    pub threads: usize,
    pub iterations: u64,
    pub depth: u32,
}

/// Outcome of a stress run
#[derive(Debug)]
pub struct StressReport {
    /// Increments the counter should have received
    pub expected: u64,
    /// Increments it actually received
    pub counted: u64,
    /// Times a thread entered while another was inside
    pub overlaps: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl StressReport {
    /// No overlap and no lost update
    pub fn is_clean(&self) -> bool {
        self.overlaps == 0 && self.counted == self.expected
    }
}

/// State the workers touch inside the critical section
#[derive(Default)]
struct Shared {
    /// Threads currently inside
    inside: AtomicUsize,
    overlaps: AtomicUsize,
    /// Incremented with a separate load and store, so only the lock keeps it exact
    counter: AtomicU64,
}

pub fn execute(config: &StressConfig, color: ColorChoice) -> anyhow::Result<()> {
    let mut out = StyledOutput::new(color);
    let lock = exclusive_lock();

    out.bold(&format!(
        "Stressing {} with {} thread(s) x {} iteration(s), depth {}",
        lock.id(),
        config.threads,
        config.iterations,
        config.depth
    ));
    out.newline();

    let report = run(config, lock)?;

    if report.is_clean() {
        out.pass_badge();
    } else {
        out.fail_badge();
    }
    out.plain(&format!(
        " {}/{} increments, {} overlap(s) in {:.2?}",
        report.counted, report.expected, report.overlaps, report.elapsed
    ));
    out.newline();

    if !report.is_clean() {
        out.error("mutual exclusion violated");
        out.newline();
        anyhow::bail!(
            "lost {} update(s), {} overlap(s)",
            report.expected.saturating_sub(report.counted),
            report.overlaps
        );
    }
    Ok(())
}

/// Run the workers against `lock` and report what they observed.
pub fn run(config: &StressConfig, lock: Arc<ReentrantLock>) -> anyhow::Result<StressReport> {
    anyhow::ensure!(config.threads > 0, "need at least one thread");
    anyhow::ensure!(config.depth > 0, "depth must be at least 1");
    let expected = (config.threads as u64)
        .checked_mul(config.iterations)
        .with_context(|| {
            format!(
                "{} thread(s) x {} iteration(s) overflows the counter",
                config.threads, config.iterations
            )
        })?;

    let shared = Arc::new(Shared::default());
    let start = Instant::now();

    let handles = (0..config.threads)
        .map(|index| {
            let lock = Arc::clone(&lock);
            let shared = Arc::clone(&shared);
            let iterations = config.iterations;
            let depth = config.depth;
            thread::Builder::new()
                .name(format!("stress-{}", index))
                .spawn(move || hammer(&lock, &shared, iterations, depth))
                .context("failed to spawn stress thread")
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("stress thread panicked"))??;
    }

    let elapsed = start.elapsed();
    log::info!("stress run finished in {:?}: {}", elapsed, lock.snapshot());

    Ok(StressReport {
        expected,
        counted: shared.counter.load(Ordering::Relaxed),
        overlaps: shared.overlaps.load(Ordering::SeqCst),
        elapsed,
    })
}

fn hammer(lock: &ReentrantLock, shared: &Shared, iterations: u64, depth: u32) -> anyhow::Result<()> {
    for _ in 0..iterations {
        for _ in 0..depth {
            lock.lock()?;
        }

        if shared.inside.fetch_add(1, Ordering::SeqCst) != 0 {
            shared.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let value = shared.counter.load(Ordering::Relaxed);
        shared.counter.store(value + 1, Ordering::Relaxed);
        shared.inside.fetch_sub(1, Ordering::SeqCst);

        lock.release(depth)?;
    }
    Ok(())
}

//! `relock demo` — Threads take turns on the shared lock, re-entering it.

use crate::output::StyledOutput;
use anyhow::Context;
use relock_core::{exclusive_lock, QueuedSynchronizer, ReentrantLock, ReentrantLockGuard};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use termcolor::ColorChoice;

pub struct DemoConfig {
    pub threads: usize,
    pub hold: Duration,
    pub depth: u32,
}

/// Something a worker did while holding the lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoEvent {
    Acquired { worker: String },
    Reentered { worker: String, hold_count: u32 },
    Released { worker: String },
}

impl DemoEvent {
    fn worker(&self) -> &str {
        match self {
            DemoEvent::Acquired { worker }
            | DemoEvent::Reentered { worker, .. }
            | DemoEvent::Released { worker } => worker,
        }
    }
}

pub fn execute(config: &DemoConfig, color: ColorChoice) -> anyhow::Result<()> {
    let mut out = StyledOutput::new(color);
    let lock = exclusive_lock();

    out.bold(&format!(
        "{} worker(s) sharing {} (depth {}, hold {:?})",
        config.threads,
        lock.id(),
        config.depth,
        config.hold
    ));
    out.newline();

    for event in run(config, lock)? {
        print_event(&mut out, &event);
    }
    Ok(())
}

/// Run the workers and return what they did, in lock order.
pub fn run(config: &DemoConfig, lock: Arc<ReentrantLock>) -> anyhow::Result<Vec<DemoEvent>> {
    let (tx, rx) = mpsc::channel();

    let handles = (0..config.threads)
        .map(|index| {
            let lock = Arc::clone(&lock);
            let tx = tx.clone();
            let hold = config.hold;
            let depth = config.depth;
            thread::Builder::new()
                .name(worker_name(index))
                .spawn(move || work(&lock, &tx, hold, depth))
                .context("failed to spawn worker thread")
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    drop(tx);

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))??;
    }

    Ok(rx.into_iter().collect())
}

fn work(
    lock: &ReentrantLock,
    tx: &Sender<DemoEvent>,
    hold: Duration,
    depth: u32,
) -> anyhow::Result<()> {
    let worker = thread::current().name().unwrap_or("worker").to_string();

    let guard = lock.lock_guard()?;
    log::debug!("{} acquired {}", worker, lock.id());
    let _ = tx.send(DemoEvent::Acquired {
        worker: worker.clone(),
    });

    let mut nested = reenter(lock, tx, &worker, depth)?;

    thread::sleep(hold);

    while let Some(inner) = nested.pop() {
        inner.unlock()?;
    }

    // Sent before the final release so the channel keeps lock order.
    let _ = tx.send(DemoEvent::Released { worker });
    guard.unlock()?;
    Ok(())
}

/// Take `depth` nested holds, one guard each.
///
/// On failure the guards taken so far are dropped, so the caller's hold
/// count is back where it started.
fn reenter<'a>(
    lock: &'a ReentrantLock,
    tx: &Sender<DemoEvent>,
    worker: &str,
    depth: u32,
) -> anyhow::Result<Vec<ReentrantLockGuard<'a, QueuedSynchronizer>>> {
    let mut nested = Vec::new();
    for _ in 0..depth {
        nested.push(lock.lock_guard()?);
        let _ = tx.send(DemoEvent::Reentered {
            worker: worker.to_string(),
            hold_count: lock.hold_count(),
        });
    }
    Ok(nested)
}

fn worker_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => format!("worker-{}", char::from(b'A' + i)),
        _ => format!("worker-{}", index),
    }
}

fn print_event(out: &mut StyledOutput, event: &DemoEvent) {
    out.info(&format!("{:<10}", event.worker()));
    match event {
        DemoEvent::Acquired { .. } => out.success("acquired the lock"),
        DemoEvent::Reentered { hold_count, .. } => {
            out.plain(&format!("re-entered (hold count {})", hold_count))
        }
        DemoEvent::Released { .. } => out.plain("released the lock"),
    }
    out.newline();
}

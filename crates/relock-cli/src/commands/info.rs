//! `relock info` — Display version and environment info.

use relock_core::{exclusive_lock, OwnerId};

pub fn execute() -> anyhow::Result<()> {
    // Version
    println!("Relock v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // Platform
    println!("Platform:     {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    println!("CPUs:         {}", num_cpus::get());
    println!("Main thread:  {}", OwnerId::current());
    println!("Shared lock:  {}", exclusive_lock().snapshot());

    // Environment
    println!();
    println!("Environment:");
    print_env("  RELOCK_LOG", "RELOCK_LOG");
    print_env("  NO_COLOR", "NO_COLOR");

    Ok(())
}

fn print_env(label: &str, var: &str) {
    match std::env::var(var) {
        Ok(val) => println!("{} = {}", label, val),
        Err(_) => println!("{} (not set)", label),
    }
}

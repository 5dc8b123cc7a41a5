//! Subcommand implementations

pub mod demo;
pub mod info;
pub mod stress;

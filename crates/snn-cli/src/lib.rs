//! Library surface for the `snn` CLI, split out from `main.rs` so commands
//! can be exercised directly in tests without spawning a process.

pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;

pub use commands::SnnCli;

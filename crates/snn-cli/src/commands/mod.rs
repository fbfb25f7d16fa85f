//! CLI command implementations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

pub mod run;
pub mod train;

/// A discrete-time spiking neural network runtime and reward-modulated trainer.
#[derive(Parser, Debug)]
#[command(name = "snn", version, about = "Spiking neural network runtime and trainer")]
pub struct SnnCli {
    /// Enable debug-level logging regardless of `RUST_LOG`.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// CLI configuration file (defaults to the platform config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a single episode against a loaded network.
    Run(run::RunCommand),
    /// Train a network over a dataset for a number of epochs.
    Train(train::TrainCommand),
}

impl SnnCli {
    /// Dispatch to the selected subcommand.
    pub fn execute(self) -> CliResult<()> {
        match self.command {
            Command::Run(cmd) => cmd.execute(),
            Command::Train(cmd) => cmd.execute(),
        }
    }
}

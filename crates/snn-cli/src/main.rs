//! `snn` — command-line front end for the spiking neural network runtime.
//!
//! A thin wrapper (spec.md §6): it loads `.net`/`.seq` files, drives
//! [`snn_core::Trainer`], and prints JSON. All simulation and training logic
//! lives in `snn-core`; this crate only owns argument parsing, logging
//! setup, and the dataset manifest format.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use snn_cli::SnnCli;

fn main() {
    let cli = SnnCli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    if let Err(err) = cli.execute() {
        error!("{err}");
        std::process::exit(1);
    }
}

//! `snn run`: evaluate one episode against a loaded network.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use tracing::info;

use snn_core::persistence::{load_net, load_seq};
use snn_core::{NeuronId, Trainer, TrainingConfig};

use crate::error::CliResult;

/// Evaluate a single episode and print its outcome as JSON.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Path to the `.net` network file.
    #[arg(long)]
    pub net: PathBuf,

    /// Path to the `.seq` input sequence file.
    #[arg(long)]
    pub seq: PathBuf,

    /// Expected winning output id. When given, the printed `accuracy` field
    /// is 1.0 if the detector's winner matches, 0.0 otherwise; when omitted,
    /// `accuracy` is left out entirely (there is nothing to score against).
    #[arg(long)]
    pub target: Option<String>,

    /// Ticks of warmup before the rate window begins.
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Ticks in the rate-accumulation window.
    #[arg(long)]
    pub window: Option<u64>,

    /// Where to write the JSON result; stdout if omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunCommand {
    /// Load the network and sequence, evaluate one episode, and emit JSON.
    pub fn execute(self) -> CliResult<()> {
        let mut network = load_net(&self.net)?;
        let mut sequence = load_seq(&self.seq)?;

        let mut config = TrainingConfig::default();
        if let Some(warmup) = self.warmup {
            config.warmup = warmup;
        }
        if let Some(window) = self.window {
            config.window = window;
        }

        info!(net = %self.net.display(), seq = %self.seq.display(), "evaluating episode");
        let trainer = Trainer::new(0);
        let metrics = trainer.evaluate(&mut network, &mut sequence, &config);

        let winner = metrics.winner_id.as_ref().map(NeuronId::to_string);
        let detail = json!({
            "index": 0,
            "winner": winner,
            "margin": metrics.margin,
        });

        let mut report = json!({
            "scenario": self.net.display().to_string(),
            "details": [detail],
        });
        if let Some(target) = &self.target {
            let accuracy = if winner.as_deref() == Some(target.as_str()) { 1.0 } else { 0.0 };
            report["accuracy"] = json!(accuracy);
        }

        let text = serde_json::to_string_pretty(&report)?;
        match &self.output {
            Some(path) => std::fs::write(path, text)?,
            None => println!("{text}"),
        }
        Ok(())
    }
}

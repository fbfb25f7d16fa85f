//! `snn train`: run a reward-modulated training run over a dataset manifest.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use tracing::{info, warn};

use snn_core::persistence::load_net;
use snn_core::{Trainer, TrainingConfig};

use crate::dataset::load_manifest;
use crate::error::{CliError, CliResult};

/// Train a network over a dataset for a number of epochs.
#[derive(Args, Debug)]
pub struct TrainCommand {
    /// Path to the `.net` network file.
    #[arg(long)]
    pub net: PathBuf,

    /// Dataset manifest: one `<seq_path> <target_id>` pair per line.
    #[arg(long)]
    pub dataset: PathBuf,

    /// Number of epochs to train.
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// RNG seed for the trainer (reproducibility).
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Optional TOML file overriding `TrainingConfig` defaults.
    #[arg(long)]
    pub training_config: Option<PathBuf>,

    /// Where to save the trained `.net` after the run; unchanged on disk if omitted.
    #[arg(long)]
    pub save_net: Option<PathBuf>,

    /// Where to write the JSON training history; stdout if omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TrainCommand {
    /// Load the network and dataset, train for `epochs` epochs, and emit
    /// the per-epoch accuracy/margin history as JSON.
    pub fn execute(self) -> CliResult<()> {
        let mut network = load_net(&self.net)?;
        let mut dataset = load_manifest(&self.dataset)?;
        if dataset.is_empty() {
            warn!(dataset = %self.dataset.display(), "no valid episodes in dataset; nothing to train on");
        }

        let mut config = match &self.training_config {
            Some(path) => load_training_config(path)?,
            None => TrainingConfig::default(),
        };
        config.seed = self.seed;
        config.validate()?;

        info!(net = %self.net.display(), dataset = %self.dataset.display(), epochs = self.epochs, "starting training run");
        let mut trainer = Trainer::new(self.seed);
        let history = trainer.train_epoch(&mut network, &mut dataset, self.epochs, &config, None);

        if let Some(path) = &self.save_net {
            snn_core::persistence::save_net(&network, path)?;
        }

        let report = json!({
            "epochs": history.accuracy.len(),
            "accuracy": history.accuracy,
            "margin": history.margin,
        });
        let text = serde_json::to_string_pretty(&report)?;
        match &self.output {
            Some(path) => std::fs::write(path, text)?,
            None => println!("{text}"),
        }
        Ok(())
    }
}

/// Load a `TrainingConfig` override from TOML. The config carries no
/// built-in `serde` support (it is a plain value type per spec.md §4.6), so
/// this only overrides the handful of fields exposed as CLI-editable knobs;
/// anything else stays at its `Default`.
fn load_training_config(path: &std::path::Path) -> CliResult<TrainingConfig> {
    #[derive(serde::Deserialize, Default)]
    struct Overrides {
        warmup: Option<u64>,
        window: Option<u64>,
        batch_size: Option<usize>,
        lr: Option<f64>,
        weight_decay: Option<f64>,
        shuffle: Option<bool>,
        verbose: Option<bool>,
    }

    let text = std::fs::read_to_string(path)?;
    let overrides: Overrides = toml::from_str(&text).map_err(|e| CliError::config(format!("invalid training config {}: {e}", path.display())))?;

    let mut config = TrainingConfig::default();
    if let Some(v) = overrides.warmup {
        config.warmup = v;
    }
    if let Some(v) = overrides.window {
        config.window = v;
    }
    if let Some(v) = overrides.batch_size {
        config.batch_size = v;
    }
    if let Some(v) = overrides.lr {
        config.lr = v;
    }
    if let Some(v) = overrides.weight_decay {
        config.weight_decay = v;
    }
    if let Some(v) = overrides.shuffle {
        config.shuffle = v;
    }
    if let Some(v) = overrides.verbose {
        config.verbose = v;
    }
    Ok(config)
}

//! All tunable hyperparameters for the trainer and its plasticity rules.

use crate::error::{CoreError, Result};
use crate::ids::NeuronId;

/// Detector construction parameters, embedded in [`TrainingConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// EMA smoothing factor, `(0, 1]`.
    pub alpha: f64,
    /// Minimum best-rate required before abstaining to `default_id`.
    pub threshold: f64,
    /// Id returned on abstention (`None` means abstain with no id).
    pub default_id: Option<NeuronId>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            threshold: 0.0,
            default_id: None,
        }
    }
}

/// Which edges a reward-modulated update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateGating {
    /// Every existing edge is updated.
    #[default]
    None,
    /// Only edges whose target is the detector's predicted winner.
    WinnerOnly,
    /// Only edges whose target is the episode's target id.
    TargetOnly,
}

/// How `reward_raw` is shaped from the episode's rates.
#[derive(Debug, Clone, PartialEq)]
pub enum RewardShape {
    /// `reward_pos` if the episode was a correct, confident win (gated by
    /// the shared `margin_delta`), else `reward_neg`.
    Binary { reward_pos: f64, reward_neg: f64 },
    /// `clamp(reward_gain * target_margin, [reward_min, reward_max])`.
    MarginLinear {
        reward_gain: f64,
        reward_min: f64,
        reward_max: f64,
    },
    /// `sigmoid(reward_gain * (margin_delta - target_margin))`, optionally
    /// clamped to `clamp_range`.
    SoftplusMargin {
        reward_gain: f64,
        clamp_range: Option<(f64, f64)>,
    },
}

impl Default for RewardShape {
    fn default() -> Self {
        RewardShape::MarginLinear {
            reward_gain: 4.0,
            reward_min: -1.0,
            reward_max: 1.0,
        }
    }
}

/// A simple, closed topology policy for structural growth: which kinds of
/// candidate edges are acceptable, beyond the universal self-loop and
/// already-exists rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyPolicy {
    /// Any non-self, non-duplicate pair is acceptable.
    #[default]
    Unrestricted,
    /// Edges that would target a sensory neuron are rejected (sensory
    /// neurons are conventionally injected into, not grown into).
    NoSensoryTargets,
}

/// Which per-epoch history series a revert decision watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevertMetric {
    #[default]
    Accuracy,
    Margin,
}

/// All tunable hyperparameters for [`crate::trainer::Trainer`]. A plain
/// value-type aggregate: construct via [`TrainingConfig::default`] and
/// override fields, then call [`TrainingConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Output readout used during `evaluate`/`compute_episode_delta`.
    pub detector: DetectorConfig,
    /// Ticks run before the rate window begins (dynamics settle).
    pub warmup: u64,
    /// Ticks in the rate-accumulation window, after warmup.
    pub window: u64,
    /// Shuffle the dataset at the start of every epoch.
    pub shuffle: bool,

    /// Per-neuron firing-rate EMA factor, used by intrinsic plasticity and
    /// (optionally) as the eligibility trace's post term.
    pub rate_alpha: f64,
    /// Eligibility trace decay `λ`.
    pub elig_lambda: f64,
    /// Use the post-neuron's EMA rate (rather than its binary fire flag) as
    /// the eligibility trace's post term.
    pub elig_post_use_rate: bool,

    /// Reward shaping function.
    pub reward_shape: RewardShape,
    /// Shared margin threshold for both `Binary`'s win condition and the
    /// no-update-if-satisfied gate.
    pub margin_delta: f64,
    /// Enable the exponential reward baseline (`reward_raw - baseline`).
    pub baseline_enable: bool,
    /// Baseline EMA factor `β`.
    pub baseline_beta: f64,

    /// Which edges an episode's delta touches.
    pub update_gating: UpdateGating,
    /// Learning rate applied to `reward * eligibility`.
    pub lr: f64,
    /// Episodes per batch.
    pub batch_size: usize,

    /// Multiplicative weight decay applied every batch.
    pub weight_decay: f64,
    /// Optional symmetric weight clip, `|w| <= weight_clip`.
    pub weight_clip: Option<f64>,
    /// Gain on the usage-boost modulation term.
    pub usage_boost_gain: f64,

    /// Prune an edge once `|w| < prune_epsilon` for this many consecutive batches.
    pub prune_epsilon: f64,
    pub prune_patience: u32,
    /// Up to this many new edges grown per batch.
    pub grow_edges: usize,
    /// Magnitude used for newly grown edges (random sign).
    pub init_weight: f64,
    /// Constraint on which candidate edges structural growth may add.
    pub topology_policy: TopologyPolicy,

    /// Intrinsic plasticity: threshold learning rate.
    pub eta_theta: f64,
    /// Intrinsic plasticity: leak learning rate.
    pub eta_leak: f64,
    /// Intrinsic plasticity: target firing rate.
    pub target_rate: f64,

    /// A neuron whose EMA rate stays below this for `inactive_rate_patience`
    /// consecutive batches becomes eligible for inactivity pruning.
    pub inactive_rate_threshold: f64,
    pub inactive_rate_patience: u32,
    pub prune_inactive_max: usize,
    pub prune_inactive_out: bool,
    pub prune_inactive_in: bool,

    /// Capture a snapshot into the ring buffer at the end of every epoch.
    pub checkpoints_enable: bool,
    pub ckpt_l0: usize,
    pub ckpt_l1: usize,
    pub ckpt_l2: usize,

    /// Revert one checkpoint when the watched metric regresses.
    pub revert_enable: bool,
    pub revert_window: usize,
    pub revert_drop: f64,
    pub revert_metric: RevertMetric,

    /// Independent normal noise added to every weight before the first epoch.
    pub weight_jitter_std: f64,
    /// Independent random onset delay added to constructed input sequences
    /// (built-in synthetic datasets only; has no effect on sequences loaded
    /// from `.seq` files, since those carry no generation hook to jitter).
    pub timing_jitter: f64,

    /// Emit a `log::info!` summary every `log_every` epochs when `verbose`.
    pub verbose: bool,
    pub log_every: u32,
    /// Record per-batch wall-clock timing into the training history.
    pub perf_enabled: bool,

    /// Initial RNG seed (also settable later via `Trainer::reseed`).
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            warmup: 10,
            window: 90,
            shuffle: true,

            rate_alpha: 0.05,
            elig_lambda: 0.9,
            elig_post_use_rate: false,

            reward_shape: RewardShape::default(),
            margin_delta: 0.1,
            baseline_enable: false,
            baseline_beta: 0.05,

            update_gating: UpdateGating::None,
            lr: 0.01,
            batch_size: 8,

            weight_decay: 0.0,
            weight_clip: None,
            usage_boost_gain: 0.0,

            prune_epsilon: 0.0,
            prune_patience: 1,
            grow_edges: 0,
            init_weight: 0.1,
            topology_policy: TopologyPolicy::default(),

            eta_theta: 0.0,
            eta_leak: 0.0,
            target_rate: 0.1,

            inactive_rate_threshold: 0.0,
            inactive_rate_patience: 1,
            prune_inactive_max: 0,
            prune_inactive_out: false,
            prune_inactive_in: false,

            checkpoints_enable: false,
            ckpt_l0: 3,
            ckpt_l1: 3,
            ckpt_l2: 3,

            revert_enable: false,
            revert_window: 1,
            revert_drop: 1.0,
            revert_metric: RevertMetric::default(),

            weight_jitter_std: 0.0,
            timing_jitter: 0.0,

            verbose: false,
            log_every: 1,
            perf_enabled: false,

            seed: 0,
        }
    }
}

impl TrainingConfig {
    /// Check the invariants the hot path assumes hold; does not mutate.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detector.alpha) || self.detector.alpha == 0.0 {
            return Err(CoreError::invalid_parameter(
                "detector.alpha",
                self.detector.alpha.to_string(),
                "(0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.rate_alpha) || self.rate_alpha == 0.0 {
            return Err(CoreError::invalid_parameter(
                "rate_alpha",
                self.rate_alpha.to_string(),
                "(0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.elig_lambda) {
            return Err(CoreError::invalid_parameter(
                "elig_lambda",
                self.elig_lambda.to_string(),
                "[0, 1]",
            ));
        }
        if self.batch_size == 0 {
            return Err(CoreError::invalid_parameter("batch_size", "0", ">= 1"));
        }
        if self.baseline_beta < 0.0 || self.baseline_beta > 1.0 {
            return Err(CoreError::invalid_parameter(
                "baseline_beta",
                self.baseline_beta.to_string(),
                "[0, 1]",
            ));
        }
        if self.window == 0 && self.warmup == 0 {
            return Err(CoreError::invalid_parameter("warmup+window", "0", ">= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_detector_alpha_is_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.detector.alpha = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_elig_lambda_is_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.elig_lambda = 1.5;
        assert!(cfg.validate().is_err());
    }
}

//! Episode evaluation, eligibility-trace accumulation, reward-modulated
//! weight updates, structural/intrinsic plasticity, and checkpoint/revert.

pub mod config;
mod reward;

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub use config::{DetectorConfig, RevertMetric, RewardShape, TopologyPolicy, TrainingConfig, UpdateGating};

use crate::detector::EmaDetector;
use crate::ids::{NeuronId, NeuronKind};
use crate::network::{Network, Snapshot};
use crate::sequence::InputSequence;

/// The outcome of one episode: the detector's call and the rates it was
/// based on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EpisodeMetrics {
    pub winner_id: Option<NeuronId>,
    pub margin: f64,
    /// `(output_id, rate)`, in canonical output-id order.
    pub rates: Vec<(NeuronId, f64)>,
    pub ticks_run: u64,
}

/// The per-edge weight delta and usage accumulated by one episode, plus the
/// metrics and shaped reward that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeDelta {
    pub delta: HashMap<(NeuronId, NeuronId), f64>,
    pub usage: HashMap<(NeuronId, NeuronId), f64>,
    pub metrics: EpisodeMetrics,
    pub reward: f64,
}

/// Aggregate outcome of one `train_batch` call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatchMetrics {
    pub accuracy: f64,
    pub mean_margin: f64,
    pub episodes: usize,
}

/// Optional opt-in wall-clock instrumentation, mirroring a perf report you
/// would attach to a simulation run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PerfReport {
    pub total_elapsed: Duration,
    pub batch_elapsed: Vec<Duration>,
}

/// Per-epoch accuracy/margin series, plus optional perf instrumentation.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrainingHistory {
    pub accuracy: Vec<f64>,
    pub margin: Vec<f64>,
    pub perf: Option<PerfReport>,
}

#[derive(Default)]
struct CheckpointRing {
    l0: VecDeque<Snapshot>,
    l1: VecDeque<Snapshot>,
    l2: VecDeque<Snapshot>,
}

impl CheckpointRing {
    fn push(&mut self, snapshot: Snapshot, cap0: usize, cap1: usize, cap2: usize) {
        self.l0.push_back(snapshot);
        while self.l0.len() > cap0.max(1) {
            if let Some(demoted) = self.l0.pop_front() {
                self.l1.push_back(demoted);
            }
        }
        while self.l1.len() > cap1 {
            if let Some(demoted) = self.l1.pop_front() {
                self.l2.push_back(demoted);
            }
        }
        while self.l2.len() > cap2 {
            self.l2.pop_front();
        }
    }

    fn pop_most_recent(&mut self) -> Option<Snapshot> {
        self.l0.pop_back().or_else(|| self.l1.pop_back()).or_else(|| self.l2.pop_back())
    }
}

/// Runs episodes against a [`Network`], accumulates eligibility traces, and
/// applies reward-modulated weight, structural, and intrinsic plasticity
/// updates. Owns its RNG and its cross-episode bookkeeping (per-neuron
/// rates, prune/inactivity counters, checkpoint ring buffer).
pub struct Trainer {
    rng: StdRng,
    /// Persistent per-neuron EMA firing rate, updated every tick of every
    /// episode and *not* reset at episode boundaries (unlike the detector
    /// and eligibility traces, which are local to a single episode).
    neuron_rates: HashMap<NeuronId, f64>,
    prune_counters: HashMap<(NeuronId, NeuronId), u32>,
    inactive_counters: HashMap<NeuronId, u32>,
    baseline: f64,
    checkpoints: CheckpointRing,
}

impl Trainer {
    /// Construct a trainer seeded for reproducibility.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            neuron_rates: HashMap::new(),
            prune_counters: HashMap::new(),
            inactive_counters: HashMap::new(),
            baseline: 0.0,
            checkpoints: CheckpointRing::default(),
        }
    }

    /// Re-seed the trainer's RNG. Does not touch rates, counters, or
    /// checkpoints.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Manually pop the most recent checkpoint (preferring `L0`, then `L1`,
    /// then `L2`) and restore it onto `network`. Returns `false` with no
    /// effect if no checkpoint has been captured. `train_epoch` calls this
    /// internally when `revert_enable` triggers; it is also exposed
    /// directly for callers that want to revert outside of training.
    pub fn revert(&mut self, network: &mut Network) -> bool {
        match self.checkpoints.pop_most_recent() {
            Some(snapshot) => {
                network.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    fn output_ids(network: &Network) -> Vec<NeuronId> {
        network
            .neurons()
            .iter()
            .filter(|n| n.kind() == NeuronKind::Output)
            .map(|n| n.id().clone())
            .collect()
    }

    /// Run one episode without touching eligibility, reward, or weights:
    /// just drive the network and read off the detector's call. Used both
    /// standalone (e.g. the CLI's `run` command) and as the first half of
    /// [`Trainer::compute_episode_delta`].
    pub fn evaluate(&self, network: &mut Network, sequence: &mut InputSequence, config: &TrainingConfig) -> EpisodeMetrics {
        let output_ids = Self::output_ids(network);
        let mut detector = EmaDetector::new(config.detector.alpha, config.detector.threshold, config.detector.default_id.clone());
        sequence.reset();

        let ticks = config.warmup + config.window;
        for _ in 0..ticks {
            for (id, value) in sequence.get_current_inputs().to_vec() {
                network.inject_sensory(&id, value as f64);
            }
            network.tick();
            for o in &output_ids {
                let fired = network.neuron(o).is_some_and(|n| n.did_fire_this_tick());
                detector.update(o, fired);
            }
            sequence.advance();
        }

        let rates: Vec<(NeuronId, f64)> = output_ids.iter().map(|o| (o.clone(), detector.rate(o))).collect();
        EpisodeMetrics {
            winner_id: detector.predict(&output_ids),
            margin: detector.margin(&output_ids),
            rates,
            ticks_run: ticks,
        }
    }

    /// Run one episode, accumulating eligibility traces and shaping a
    /// reward against `target_id`, and return the per-edge delta it implies
    /// (without applying it — that's [`Trainer::train_batch`]'s job).
    pub fn compute_episode_delta(
        &mut self,
        network: &mut Network,
        sequence: &mut InputSequence,
        config: &TrainingConfig,
        target_id: &NeuronId,
    ) -> EpisodeDelta {
        let output_ids = Self::output_ids(network);
        let mut detector = EmaDetector::new(config.detector.alpha, config.detector.threshold, config.detector.default_id.clone());
        let mut eligibility: HashMap<(NeuronId, NeuronId), f64> = HashMap::new();
        sequence.reset();

        let ticks = config.warmup + config.window;
        for _ in 0..ticks {
            for (id, value) in sequence.get_current_inputs().to_vec() {
                network.inject_sensory(&id, value as f64);
            }
            network.tick();

            for o in &output_ids {
                let fired = network.neuron(o).is_some_and(|n| n.did_fire_this_tick());
                detector.update(o, fired);
            }

            for neuron in network.neurons() {
                let rate = self.neuron_rates.entry(neuron.id().clone()).or_insert(0.0);
                *rate = (1.0 - config.rate_alpha) * *rate + config.rate_alpha * if neuron.did_fire_this_tick() { 1.0 } else { 0.0 };
            }

            for (from, to, _weight) in network.get_weights() {
                let pre = network.neuron(&from).is_some_and(|n| n.did_fire_this_tick());
                let post = if config.elig_post_use_rate {
                    self.neuron_rates.get(&to).copied().unwrap_or(0.0)
                } else {
                    network.neuron(&to).is_some_and(|n| n.did_fire_this_tick()) as u8 as f64
                };
                let e = eligibility.entry((from, to)).or_insert(0.0);
                *e = config.elig_lambda * *e + if pre { post } else { 0.0 };
            }

            sequence.advance();
        }

        let rates: Vec<(NeuronId, f64)> = output_ids.iter().map(|o| (o.clone(), detector.rate(o))).collect();
        let winner = detector.predict(&output_ids);
        let margin = detector.margin(&output_ids);
        let metrics = EpisodeMetrics {
            winner_id: winner.clone(),
            margin,
            rates: rates.clone(),
            ticks_run: ticks,
        };

        let t_margin = reward::target_margin(&rates, target_id);
        let reward_raw = reward::shape_reward(config, winner.as_ref(), target_id, margin, t_margin);
        let reward_raw = if config.baseline_enable {
            self.baseline = (1.0 - config.baseline_beta) * self.baseline + config.baseline_beta * reward_raw;
            reward_raw - self.baseline
        } else {
            reward_raw
        };
        let reward = reward::gate_if_satisfied(config, reward_raw, winner.as_ref(), target_id, margin);

        let mut delta = HashMap::new();
        let mut usage = HashMap::new();
        for (from, to, _weight) in network.get_weights() {
            let gate_pass = match config.update_gating {
                UpdateGating::None => true,
                UpdateGating::WinnerOnly => winner.as_ref() == Some(&to),
                UpdateGating::TargetOnly => &to == target_id,
            };
            if !gate_pass {
                continue;
            }
            let e = eligibility.get(&(from.clone(), to.clone())).copied().unwrap_or(0.0);
            delta.insert((from.clone(), to.clone()), config.lr * reward * e);
            usage.insert((from, to), e.abs());
        }

        EpisodeDelta { delta, usage, metrics, reward }
    }

    /// Run a batch of episodes, sum their deltas, and apply weight decay,
    /// clipping, usage-boost, structural, and intrinsic plasticity updates.
    /// An empty batch is a no-op.
    pub fn train_batch(&mut self, network: &mut Network, batch: &mut [(InputSequence, NeuronId)], config: &TrainingConfig) -> BatchMetrics {
        if batch.is_empty() {
            return BatchMetrics::default();
        }

        let mut sum_delta: HashMap<(NeuronId, NeuronId), f64> = HashMap::new();
        let mut sum_usage: HashMap<(NeuronId, NeuronId), f64> = HashMap::new();
        let mut correct = 0usize;
        let mut margin_sum = 0.0;
        let mut reward_sum = 0.0;

        for (sequence, target) in batch.iter_mut() {
            let episode = self.compute_episode_delta(network, sequence, config, target);
            for (edge, d) in episode.delta {
                *sum_delta.entry(edge).or_insert(0.0) += d;
            }
            for (edge, u) in episode.usage {
                *sum_usage.entry(edge).or_insert(0.0) += u;
            }
            if episode.metrics.winner_id.as_ref() == Some(target) {
                correct += 1;
            }
            margin_sum += episode.metrics.margin;
            reward_sum += episode.reward;
        }

        let batch_size = batch.len() as f64;
        let mean_reward = reward_sum / batch_size;

        for (edge, d) in &sum_delta {
            let current = network.weight(&edge.0, &edge.1).unwrap_or(0.0);
            network.set_weight(&edge.0, &edge.1, current + d / batch_size);
        }

        for (from, to, weight) in network.get_weights() {
            let decayed = weight - config.weight_decay * weight;
            network.set_weight(&from, &to, decayed);
        }

        if let Some(clip) = config.weight_clip {
            for (from, to, weight) in network.get_weights() {
                network.set_weight(&from, &to, weight.clamp(-clip, clip));
            }
        }

        if config.usage_boost_gain != 0.0 {
            for (from, to, weight) in network.get_weights() {
                let usage = sum_usage.get(&(from.clone(), to.clone())).copied().unwrap_or(0.0);
                let boost = config.usage_boost_gain * mean_reward * (usage / batch_size).clamp(0.0, 1.0);
                network.set_weight(&from, &to, weight + boost);
            }
        }

        self.apply_structural_plasticity(network, config);
        self.apply_intrinsic_plasticity(network, config);
        self.apply_inactivity_pruning(network, config);

        BatchMetrics {
            accuracy: correct as f64 / batch_size,
            mean_margin: margin_sum / batch_size,
            episodes: batch.len(),
        }
    }

    fn apply_structural_plasticity(&mut self, network: &mut Network, config: &TrainingConfig) {
        let mut to_prune = Vec::new();
        for (from, to, weight) in network.get_weights() {
            let key = (from.clone(), to.clone());
            if weight.abs() < config.prune_epsilon {
                let counter = self.prune_counters.entry(key.clone()).or_insert(0);
                *counter += 1;
                if *counter >= config.prune_patience {
                    to_prune.push(key.clone());
                    self.prune_counters.remove(&key);
                }
            } else {
                self.prune_counters.remove(&key);
            }
        }
        for (from, to) in to_prune {
            network.remove_edge(&from, &to);
        }

        if config.grow_edges > 0 {
            let ids: Vec<NeuronId> = network.neuron_ids().cloned().collect();
            if ids.len() >= 2 {
                let mut grown = 0usize;
                let max_attempts = config.grow_edges * 20;
                for _ in 0..max_attempts {
                    if grown >= config.grow_edges {
                        break;
                    }
                    let from = ids[self.rng.gen_range(0..ids.len())].clone();
                    let to = ids[self.rng.gen_range(0..ids.len())].clone();
                    if from == to || network.weight(&from, &to).is_some() {
                        continue;
                    }
                    if config.topology_policy == TopologyPolicy::NoSensoryTargets && to.kind() == NeuronKind::Sensory {
                        continue;
                    }
                    let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                    if network.add_edge(&from, &to, sign * config.init_weight, 1).is_ok() {
                        grown += 1;
                    }
                }
            }
        }
    }

    fn apply_intrinsic_plasticity(&self, network: &mut Network, config: &TrainingConfig) {
        if config.eta_theta == 0.0 && config.eta_leak == 0.0 {
            return;
        }
        let ids: Vec<NeuronId> = network.neuron_ids().cloned().collect();
        for id in ids {
            let rate = self.neuron_rates.get(&id).copied().unwrap_or(0.0);
            let Some(neuron) = network.neuron(&id) else { continue };
            let new_threshold = neuron.spec().threshold + config.eta_theta * (rate - config.target_rate);
            let new_leak = neuron.spec().leak + config.eta_leak * (config.target_rate - rate);
            network.set_threshold(&id, new_threshold);
            network.set_leak(&id, new_leak);
        }
    }

    fn apply_inactivity_pruning(&mut self, network: &mut Network, config: &TrainingConfig) {
        if config.prune_inactive_max == 0 || (!config.prune_inactive_out && !config.prune_inactive_in) {
            return;
        }
        let ids: Vec<NeuronId> = network.neuron_ids().cloned().collect();
        for id in ids {
            let rate = self.neuron_rates.get(&id).copied().unwrap_or(0.0);
            if rate >= config.inactive_rate_threshold {
                self.inactive_counters.remove(&id);
                continue;
            }
            let counter = self.inactive_counters.entry(id.clone()).or_insert(0);
            *counter += 1;
            if *counter < config.inactive_rate_patience {
                continue;
            }
            self.inactive_counters.remove(&id);

            if config.prune_inactive_out {
                let mut outgoing: Vec<(NeuronId, f64)> = network.edges_from(&id).iter().map(|e| (e.to.clone(), e.weight)).collect();
                outgoing.sort_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap_or(std::cmp::Ordering::Equal));
                for (to, _) in outgoing.into_iter().take(config.prune_inactive_max) {
                    network.remove_edge(&id, &to);
                }
            }
            if config.prune_inactive_in {
                let mut incoming: Vec<(NeuronId, f64)> = network
                    .get_weights()
                    .into_iter()
                    .filter(|(_, to, _)| to == &id)
                    .map(|(from, _, w)| (from, w))
                    .collect();
                incoming.sort_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap_or(std::cmp::Ordering::Equal));
                for (from, _) in incoming.into_iter().take(config.prune_inactive_max) {
                    network.remove_edge(&from, &id);
                }
            }
        }
    }

    /// Train for `epochs` epochs over `dataset`, applying the configured
    /// per-epoch shuffle, checkpointing, and revert policy. `cancel`, if
    /// given, is polled before each epoch; a triggered cancel stops before
    /// that epoch runs, leaving the already-committed epochs untouched.
    pub fn train_epoch(
        &mut self,
        network: &mut Network,
        dataset: &mut [(InputSequence, NeuronId)],
        epochs: usize,
        config: &TrainingConfig,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> TrainingHistory {
        let mut history = TrainingHistory::default();
        if config.perf_enabled {
            history.perf = Some(PerfReport::default());
        }
        let run_start = Instant::now();

        if config.weight_jitter_std > 0.0 {
            for (from, to, weight) in network.get_weights() {
                let noise = self.sample_normal(0.0, config.weight_jitter_std);
                network.set_weight(&from, &to, weight + noise);
            }
        }

        for epoch in 0..epochs {
            if let Some(cancel_fn) = cancel {
                if cancel_fn() {
                    break;
                }
            }

            if config.shuffle {
                dataset.shuffle(&mut self.rng);
            }

            let batch_start = Instant::now();
            let mut total_episodes = 0usize;
            let mut total_correct = 0.0;
            let mut total_margin = 0.0;
            for batch in dataset.chunks_mut(config.batch_size.max(1)) {
                let batch_metrics = self.train_batch(network, batch, config);
                total_episodes += batch_metrics.episodes;
                total_correct += batch_metrics.accuracy * batch_metrics.episodes as f64;
                total_margin += batch_metrics.mean_margin * batch_metrics.episodes as f64;
            }
            if let Some(perf) = history.perf.as_mut() {
                perf.batch_elapsed.push(batch_start.elapsed());
            }

            let (epoch_accuracy, epoch_margin) = if total_episodes == 0 {
                (0.0, 0.0)
            } else {
                (total_correct / total_episodes as f64, total_margin / total_episodes as f64)
            };
            history.accuracy.push(epoch_accuracy);
            history.margin.push(epoch_margin);

            if config.verbose && epoch as u32 % config.log_every.max(1) == 0 {
                log::info!("epoch {epoch}: accuracy={epoch_accuracy:.3} margin={epoch_margin:.3}");
            }

            if config.checkpoints_enable {
                self.checkpoints.push(network.snapshot(), config.ckpt_l0, config.ckpt_l1, config.ckpt_l2);
            }

            if config.revert_enable {
                let series = match config.revert_metric {
                    RevertMetric::Accuracy => &history.accuracy,
                    RevertMetric::Margin => &history.margin,
                };
                let t = series.len() - 1;
                if t >= config.revert_window {
                    let past = series[t - config.revert_window];
                    let current = series[t];
                    let drop = past - current;
                    if drop >= config.revert_drop {
                        if let Some(snapshot) = self.checkpoints.pop_most_recent() {
                            network.restore(&snapshot);
                            log::warn!("reverted checkpoint after a regression of {drop:.3} over {} epochs", config.revert_window);
                            let keep = history.accuracy.len().saturating_sub(config.revert_window);
                            history.accuracy.truncate(keep);
                            history.margin.truncate(keep);
                            self.prune_counters.clear();
                            self.inactive_counters.clear();
                        }
                    }
                }
            }
        }

        if let Some(perf) = history.perf.as_mut() {
            perf.total_elapsed = run_start.elapsed();
        }
        history
    }

    /// Box-Muller sample from `N(mean, std)` using the trainer's own RNG.
    fn sample_normal(&mut self, mean: f64, std: f64) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std * z0
    }
}

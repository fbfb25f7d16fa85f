//! Core engine for a discrete-time, reward-modulated spiking neural network.
//!
//! A [`Network`](network::Network) of leaky-threshold [`Neuron`](neuron::Neuron)s is driven tick by
//! tick by an [`InputSequence`](sequence::InputSequence) of sensory injections. An
//! [`EmaDetector`](detector::EmaDetector) turns per-tick output spikes into a rate-coded
//! prediction, and a [`Trainer`](trainer::Trainer) evaluates episodes, accumulates
//! eligibility traces, shapes a reward, and applies weight, structural, and intrinsic
//! plasticity updates.
//!
//! Everything here is single-threaded and synchronous: a tick, a batch, and an epoch all
//! run to completion with no implicit suspension.

#![warn(clippy::all)]

pub mod detector;
pub mod error;
pub mod ids;
pub mod neuron;
pub mod network;
pub mod persistence;
pub mod sequence;
pub mod trainer;

pub use detector::{EmaDetector, StickyDetector};
pub use error::{CoreError, Result};
pub use ids::{NeuronId, NeuronKind};
pub use network::{Edge, Network, Snapshot};
pub use neuron::{Neuron, NeuronSpec};
pub use sequence::InputSequence;
pub use trainer::{
    BatchMetrics, DetectorConfig, EpisodeDelta, EpisodeMetrics, PerfReport, RevertMetric, RewardShape, Trainer, TrainingConfig,
    TrainingHistory, TopologyPolicy, UpdateGating,
};

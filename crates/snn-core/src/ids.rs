//! Stable string identifiers for neurons.

use std::fmt;
use std::sync::Arc;

/// A stable, cheaply-clonable neuron identifier.
///
/// Conventions (informational only — routing, not behavior, depends on the prefix):
/// `S*` sensory, `N*` interneuron, `O*` output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NeuronId(Arc<str>);

impl NeuronId {
    /// Create a new neuron id from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the id by its conventional prefix.
    pub fn kind(&self) -> NeuronKind {
        match self.0.chars().next() {
            Some('S') | Some('s') => NeuronKind::Sensory,
            Some('O') | Some('o') => NeuronKind::Output,
            _ => NeuronKind::Interneuron,
        }
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NeuronId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NeuronId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The routing classification a neuron id carries by convention.
///
/// This is purely informational: two neurons of different kinds behave
/// identically in the network engine. It exists so the trainer and CLI can
/// default to "all `O*` ids are outputs" without the caller having to say so
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeuronKind {
    /// Conventionally a sensory input neuron (`S*`).
    Sensory,
    /// Conventionally an interneuron (`N*` or anything else).
    Interneuron,
    /// Conventionally a readout neuron (`O*`).
    Output,
}

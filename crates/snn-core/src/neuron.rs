//! Leaky threshold neuron model.
//!
//! Each neuron integrates a single pending input per tick, fires when its
//! potential crosses threshold, and then sits out a refractory period during
//! which further input is dropped. See [`Neuron::tick`] for the exact
//! four-step update used every tick.

use crate::error::{CoreError, Result};
use crate::ids::{NeuronId, NeuronKind};

/// Fixed parameters of a neuron, validated once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronSpec {
    /// Potential at which the neuron fires.
    pub threshold: f64,
    /// Multiplicative decay applied to potential each tick, in `[0, 1]`.
    pub leak: f64,
    /// Potential the neuron is snapped to immediately after firing.
    pub resting: f64,
    /// Ticks of refractory period after a fire, during which input is dropped.
    pub refractory: u32,
}

impl NeuronSpec {
    /// Construct a spec, validating `leak` is in `[0, 1]`.
    pub fn new(threshold: f64, leak: f64, resting: f64, refractory: u32) -> Result<Self> {
        if !(0.0..=1.0).contains(&leak) {
            return Err(CoreError::invalid_parameter(
                "leak",
                leak.to_string(),
                "0.0..=1.0",
            ));
        }
        Ok(Self {
            threshold,
            leak,
            resting,
            refractory,
        })
    }

    /// Clamp an out-of-range `leak` into `[0, 1]` instead of rejecting it.
    ///
    /// Used by the `.net` loader, which logs a warning and proceeds rather
    /// than aborting the whole file on one bad parameter (spec §7,
    /// `InvalidParameter` policy: clamp and warn).
    pub fn clamped(threshold: f64, leak: f64, resting: f64, refractory: u32) -> Self {
        Self {
            threshold,
            leak: leak.clamp(0.0, 1.0),
            resting,
            refractory,
        }
    }
}

/// A single leaky-threshold unit, addressed by a stable [`NeuronId`].
///
/// Outgoing connectivity is *not* stored here: it lives on
/// [`Network`](crate::network::Network) keyed by source id, so that
/// structural plasticity can add or remove edges without touching neuron
/// state, and so snapshots capture `(threshold, leak, edges)` as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    id: NeuronId,
    kind: NeuronKind,
    spec: NeuronSpec,
    potential: f64,
    did_fire_this_tick: bool,
    refractory_remaining: u32,
    pending_input: f64,
}

impl Neuron {
    /// Create a neuron at rest, classified by its id's conventional prefix.
    pub fn new(id: NeuronId, spec: NeuronSpec) -> Self {
        let kind = id.kind();
        let resting = spec.resting;
        Self {
            id,
            kind,
            spec,
            potential: resting,
            did_fire_this_tick: false,
            refractory_remaining: 0,
            pending_input: 0.0,
        }
    }

    /// The neuron's stable id.
    pub fn id(&self) -> &NeuronId {
        &self.id
    }

    /// The neuron's conventional routing classification.
    pub fn kind(&self) -> NeuronKind {
        self.kind
    }

    /// The neuron's fixed parameters.
    pub fn spec(&self) -> &NeuronSpec {
        &self.spec
    }

    /// Current membrane potential.
    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Whether the neuron fired during the most recently completed tick.
    pub fn did_fire_this_tick(&self) -> bool {
        self.did_fire_this_tick
    }

    /// Remaining refractory ticks (0 if not refractory).
    pub fn refractory_remaining(&self) -> u32 {
        self.refractory_remaining
    }

    /// Replace the neuron's threshold (used by intrinsic plasticity and
    /// snapshot restoration). Transient state is left untouched.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.spec.threshold = threshold;
    }

    /// Replace the neuron's leak, clamped to `[0, 1]`.
    pub fn set_leak(&mut self, leak: f64) {
        self.spec.leak = leak.clamp(0.0, 1.0);
    }

    /// Add `x` to the next tick's pending input, unless the neuron is
    /// currently refractory, in which case the input is silently dropped.
    pub fn integrate(&mut self, x: f64) {
        if self.refractory_remaining == 0 {
            self.pending_input += x;
        }
    }

    /// Advance the neuron by exactly one tick.
    ///
    /// 1. If refractory, decrement the counter, clear `did_fire_this_tick`
    ///    and `pending_input`, freeze `potential`, and return.
    /// 2. Otherwise integrate: `potential <- max(resting, potential * leak + pending_input)`.
    /// 3. Fire if `potential >= threshold`: snap to `resting`, start the
    ///    refractory countdown.
    /// 4. Clear `pending_input`.
    pub fn tick(&mut self) {
        if self.refractory_remaining > 0 {
            self.refractory_remaining -= 1;
            self.did_fire_this_tick = false;
            self.pending_input = 0.0;
            return;
        }

        // Floor at `resting` rather than a hardcoded 0: with `leak = 0` the
        // decayed term vanishes entirely, so this also pins the coincidence-
        // detector case to never drift below its resting value.
        self.potential = (self.potential * self.spec.leak + self.pending_input).max(self.spec.resting);
        self.pending_input = 0.0;

        if self.potential >= self.spec.threshold {
            self.did_fire_this_tick = true;
            self.potential = self.spec.resting;
            self.refractory_remaining = self.spec.refractory;
        } else {
            self.did_fire_this_tick = false;
        }
    }
}

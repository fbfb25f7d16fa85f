//! The network: owns neurons and edges, and drives the deterministic tick.

use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, Result};
use crate::ids::NeuronId;
use crate::neuron::{Neuron, NeuronSpec};

/// A directed, weighted connection from one neuron to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Destination neuron id.
    pub to: NeuronId,
    /// Synaptic weight (sign encodes excitatory/inhibitory).
    pub weight: f64,
    /// Delay, in ticks, before a fire is delivered. Always `>= 1`.
    pub delay: u32,
}

/// A deep copy of `(threshold, leak, edges)` for every neuron, used to
/// checkpoint and later revert a training run. Transient state (potential,
/// pending input, detector rates) is intentionally not captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Per-neuron `(threshold, leak)`, in canonical order.
    pub params: Vec<(NeuronId, f64, f64)>,
    /// All edges as `(from, to, weight, delay)` triples.
    pub edges: Vec<(NeuronId, NeuronId, f64, u32)>,
}

/// Owns every neuron and edge in the simulation and advances them tick by
/// tick with deterministic, insertion-order iteration.
#[derive(Debug, Clone)]
pub struct Network {
    neurons: Vec<Neuron>,
    index: HashMap<NeuronId, usize>,
    edges: HashMap<NeuronId, Vec<Edge>>,
    /// Maturing multi-tick-delay deliveries, keyed by the tick they land on.
    delayed: BTreeMap<u64, Vec<(NeuronId, f64)>>,
    current_tick: u64,
    /// Default output id used by detectors when abstaining. Purely metadata:
    /// the engine never reads it itself.
    pub default_output_id: Option<NeuronId>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self {
            neurons: Vec::new(),
            index: HashMap::new(),
            edges: HashMap::new(),
            delayed: BTreeMap::new(),
            current_tick: 0,
            default_output_id: None,
        }
    }

    /// Insert a new neuron. Fails if `id` is already present.
    pub fn add_neuron(&mut self, id: NeuronId, spec: NeuronSpec) -> Result<()> {
        if self.index.contains_key(&id) {
            return Err(CoreError::duplicate_neuron(id.to_string()));
        }
        let slot = self.neurons.len();
        self.index.insert(id.clone(), slot);
        self.neurons.push(Neuron::new(id, spec));
        Ok(())
    }

    /// Add or update an edge. Re-adding an existing `(from, to)` pair
    /// overwrites the weight and delay rather than creating a duplicate.
    pub fn add_edge(&mut self, from: &NeuronId, to: &NeuronId, weight: f64, delay: u32) -> Result<()> {
        if !self.index.contains_key(from) {
            return Err(CoreError::unknown_neuron(from.to_string()));
        }
        if !self.index.contains_key(to) {
            return Err(CoreError::unknown_neuron(to.to_string()));
        }
        let delay = delay.max(1);
        let edges = self.edges.entry(from.clone()).or_default();
        if let Some(existing) = edges.iter_mut().find(|e| &e.to == to) {
            existing.weight = weight;
            existing.delay = delay;
        } else {
            edges.push(Edge {
                to: to.clone(),
                weight,
                delay,
            });
        }
        Ok(())
    }

    /// Remove the edge `from -> to`, if present. Unknown ids are logged and
    /// treated as a no-op, per the spec's failure semantics.
    pub fn remove_edge(&mut self, from: &NeuronId, to: &NeuronId) {
        match self.edges.get_mut(from) {
            Some(edges) => edges.retain(|e| &e.to != to),
            None => log::warn!("remove_edge: unknown source neuron {from}"),
        }
    }

    /// Inject sensory input into a neuron. A no-op (with a warning) if the
    /// id is unknown.
    pub fn inject_sensory(&mut self, id: &NeuronId, amount: f64) {
        match self.index.get(id).copied() {
            Some(idx) => self.neurons[idx].integrate(amount),
            None => log::warn!("inject_sensory: unknown neuron {id}"),
        }
    }

    /// Look up a neuron by id.
    pub fn neuron(&self, id: &NeuronId) -> Option<&Neuron> {
        self.index.get(id).map(|&i| &self.neurons[i])
    }

    /// All neurons in canonical (insertion) order.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// All neuron ids in canonical order.
    pub fn neuron_ids(&self) -> impl Iterator<Item = &NeuronId> {
        self.neurons.iter().map(|n| n.id())
    }

    /// Outgoing edges from `id`, empty if the neuron has none (or doesn't exist).
    pub fn edges_from(&self, id: &NeuronId) -> &[Edge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Current tick counter (number of completed `tick()` calls).
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Advance every neuron by exactly one tick, in two strictly-ordered
    /// phases: deliver spikes fired on the previous tick, then integrate.
    /// This is what makes a fire at tick `t` visible no earlier than tick
    /// `t + delay`.
    pub fn tick(&mut self) {
        self.deliver_spikes();
        self.integrate_neurons();
        self.current_tick += 1;
    }

    /// Phase 1: for every neuron that fired on the previous tick, queue its
    /// outgoing weight into each target's `pending_input` — immediately for
    /// `delay == 1` edges, or into the delayed queue for `delay > 1` edges.
    /// Also flushes any previously-queued delivery maturing on this tick.
    fn deliver_spikes(&mut self) {
        let firing: Vec<usize> = self
            .neurons
            .iter()
            .enumerate()
            .filter(|(_, n)| n.did_fire_this_tick())
            .map(|(i, _)| i)
            .collect();

        for idx in firing {
            let source_id = self.neurons[idx].id().clone();
            for edge in self.edges.get(&source_id).cloned().unwrap_or_default() {
                if edge.delay <= 1 {
                    if let Some(&target_idx) = self.index.get(&edge.to) {
                        self.neurons[target_idx].integrate(edge.weight);
                    }
                } else {
                    let due_at = self.current_tick + u64::from(edge.delay - 1);
                    self.delayed.entry(due_at).or_default().push((edge.to, edge.weight));
                }
            }
        }

        if let Some(matured) = self.delayed.remove(&self.current_tick) {
            for (target, weight) in matured {
                if let Some(&target_idx) = self.index.get(&target) {
                    self.neurons[target_idx].integrate(weight);
                }
            }
        }
    }

    /// Phase 2: call `tick()` on every neuron in canonical order.
    fn integrate_neurons(&mut self) {
        for neuron in &mut self.neurons {
            neuron.tick();
        }
    }

    /// Per-neuron `(ids, potentials, thresholds, leaks)`, in canonical order.
    pub fn get_state(&self) -> (Vec<NeuronId>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut ids = Vec::with_capacity(self.neurons.len());
        let mut potentials = Vec::with_capacity(self.neurons.len());
        let mut thresholds = Vec::with_capacity(self.neurons.len());
        let mut leaks = Vec::with_capacity(self.neurons.len());
        for n in &self.neurons {
            ids.push(n.id().clone());
            potentials.push(n.potential());
            thresholds.push(n.spec().threshold);
            leaks.push(n.spec().leak);
        }
        (ids, potentials, thresholds, leaks)
    }

    /// Take a deep copy of `(threshold, leak, edges)` for every neuron.
    pub fn snapshot(&self) -> Snapshot {
        let params = self
            .neurons
            .iter()
            .map(|n| (n.id().clone(), n.spec().threshold, n.spec().leak))
            .collect();
        // Walk neurons in canonical order (not `self.edges`, a HashMap whose
        // iteration order is not guaranteed stable) so two snapshots of an
        // unchanged network always compare equal.
        let mut edges = Vec::new();
        for n in &self.neurons {
            if let Some(outgoing) = self.edges.get(n.id()) {
                for e in outgoing {
                    edges.push((n.id().clone(), e.to.clone(), e.weight, e.delay));
                }
            }
        }
        Snapshot { params, edges }
    }

    /// Restore `(threshold, leak, edges)` from a previously-taken snapshot.
    /// Edges absent from the snapshot are removed; edges present but missing
    /// from the network are (re-)added.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        for (id, threshold, leak) in &snapshot.params {
            if let Some(&idx) = self.index.get(id) {
                self.neurons[idx].set_threshold(*threshold);
                self.neurons[idx].set_leak(*leak);
            }
        }

        self.edges.clear();
        for (from, to, weight, delay) in &snapshot.edges {
            if self.index.contains_key(from) && self.index.contains_key(to) {
                self.edges.entry(from.clone()).or_default().push(Edge {
                    to: to.clone(),
                    weight: *weight,
                    delay: *delay,
                });
            }
        }
    }

    /// Get the weight of an existing edge, if any.
    pub fn weight(&self, from: &NeuronId, to: &NeuronId) -> Option<f64> {
        self.edges
            .get(from)
            .and_then(|edges| edges.iter().find(|e| &e.to == to))
            .map(|e| e.weight)
    }

    /// Set the weight of an existing edge. Unknown edge is a logged no-op.
    pub fn set_weight(&mut self, from: &NeuronId, to: &NeuronId, weight: f64) {
        match self.edges.get_mut(from).and_then(|edges| edges.iter_mut().find(|e| &e.to == to)) {
            Some(edge) => edge.weight = weight,
            None => log::warn!("set_weight: no edge {from} -> {to}"),
        }
    }

    /// Set a neuron's threshold. Unknown id is a logged no-op.
    pub fn set_threshold(&mut self, id: &NeuronId, threshold: f64) {
        match self.index.get(id).copied() {
            Some(idx) => self.neurons[idx].set_threshold(threshold),
            None => log::warn!("set_threshold: unknown neuron {id}"),
        }
    }

    /// Set a neuron's leak (clamped to `[0, 1]`). Unknown id is a logged no-op.
    pub fn set_leak(&mut self, id: &NeuronId, leak: f64) {
        match self.index.get(id).copied() {
            Some(idx) => self.neurons[idx].set_leak(leak),
            None => log::warn!("set_leak: unknown neuron {id}"),
        }
    }

    /// COO triples `(from, to, weight)` for every edge, in insertion order
    /// of sources then edges.
    pub fn get_weights(&self) -> Vec<(NeuronId, NeuronId, f64)> {
        let mut out = Vec::new();
        for n in &self.neurons {
            if let Some(edges) = self.edges.get(n.id()) {
                for e in edges {
                    out.push((n.id().clone(), e.to.clone(), e.weight));
                }
            }
        }
        out
    }

    /// Apply COO triples, creating missing edges with `delay = 1`.
    pub fn set_weights(&mut self, triples: &[(NeuronId, NeuronId, f64)]) -> Result<()> {
        for (from, to, weight) in triples {
            match self.weight(from, to) {
                Some(_) => self.set_weight(from, to, *weight),
                None => self.add_edge(from, to, *weight, 1)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NeuronId {
        NeuronId::new(s)
    }

    fn spec(threshold: f64, leak: f64, resting: f64, refractory: u32) -> NeuronSpec {
        NeuronSpec::new(threshold, leak, resting, refractory).unwrap()
    }

    #[test]
    fn duplicate_neuron_is_rejected() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        let err = net.add_neuron(id("A"), spec(1.0, 1.0, 0.0, 0)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateNeuron { .. }));
    }

    #[test]
    fn edge_to_unknown_neuron_is_rejected() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        let err = net.add_edge(&id("A"), &id("B"), 1.0, 1).unwrap_err();
        assert!(matches!(err, CoreError::UnknownNeuron { .. }));
    }

    #[test]
    fn re_adding_an_edge_overwrites_weight() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        net.add_neuron(id("B"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        net.add_edge(&id("A"), &id("B"), 1.0, 1).unwrap();
        net.add_edge(&id("A"), &id("B"), 2.5, 1).unwrap();
        assert_eq!(net.edges_from(&id("A")).len(), 1);
        assert_eq!(net.weight(&id("A"), &id("B")), Some(2.5));
    }

    #[test]
    fn one_tick_synaptic_delay_default() {
        // u -> v, weight 5. u fires on tick 0 via a large injected sensory
        // input; v must not see that input until tick 1, and must not fire
        // on tick 0.
        let mut net = Network::new();
        net.add_neuron(id("U"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        net.add_neuron(id("V"), spec(100.0, 1.0, 0.0, 0)).unwrap();
        net.add_edge(&id("U"), &id("V"), 5.0, 1).unwrap();

        net.inject_sensory(&id("U"), 10.0);
        net.tick(); // tick 0: U fires, V untouched this tick
        assert!(net.neuron(&id("U")).unwrap().did_fire_this_tick());
        assert!(!net.neuron(&id("V")).unwrap().did_fire_this_tick());
        assert_eq!(net.neuron(&id("V")).unwrap().potential(), 0.0);

        net.tick(); // tick 1: V receives exactly weight 5 into pending_input
        assert_eq!(net.neuron(&id("V")).unwrap().potential(), 5.0);
    }

    #[test]
    fn multi_tick_delay_arrives_delay_ticks_later() {
        let mut net = Network::new();
        net.add_neuron(id("U"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        net.add_neuron(id("V"), spec(100.0, 1.0, 0.0, 0)).unwrap();
        net.add_edge(&id("U"), &id("V"), 7.0, 3).unwrap();

        net.inject_sensory(&id("U"), 10.0);
        net.tick(); // tick 0: U fires
        net.tick(); // tick 1: nothing arrives yet (delay 3 means arrival at tick 3)
        assert_eq!(net.neuron(&id("V")).unwrap().potential(), 0.0);
        net.tick(); // tick 2
        assert_eq!(net.neuron(&id("V")).unwrap().potential(), 0.0);
        net.tick(); // tick 3: delivery matures
        assert_eq!(net.neuron(&id("V")).unwrap().potential(), 7.0);
    }

    #[test]
    fn snapshot_restore_round_trips_threshold_leak_and_edges() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 0.9, 0.0, 0)).unwrap();
        net.add_neuron(id("B"), spec(2.0, 0.8, 0.0, 0)).unwrap();
        net.add_edge(&id("A"), &id("B"), 0.5, 1).unwrap();

        let snap = net.snapshot();

        net.set_threshold(&id("A"), 99.0);
        net.set_leak(&id("B"), 0.1);
        net.set_weight(&id("A"), &id("B"), 42.0);
        net.remove_edge(&id("A"), &id("B"));

        net.restore(&snap);

        let (ids, _potentials, thresholds, leaks) = net.get_state();
        assert_eq!(ids, vec![id("A"), id("B")]);
        assert_eq!(thresholds, vec![1.0, 2.0]);
        assert_eq!(leaks, vec![0.9, 0.8]);
        assert_eq!(net.weight(&id("A"), &id("B")), Some(0.5));
    }

    #[test]
    fn restore_is_a_no_op_when_nothing_changed() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 0.9, 0.0, 0)).unwrap();
        net.add_neuron(id("B"), spec(2.0, 0.8, 0.0, 0)).unwrap();
        net.add_edge(&id("A"), &id("B"), 0.5, 1).unwrap();

        let before = net.snapshot();
        net.restore(&before);
        let after = net.snapshot();
        assert_eq!(before, after);
    }

    #[test]
    fn get_weights_set_weights_round_trip_and_create_missing_edges() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        net.add_neuron(id("B"), spec(1.0, 1.0, 0.0, 0)).unwrap();

        net.set_weights(&[(id("A"), id("B"), 3.3)]).unwrap();
        assert_eq!(net.get_weights(), vec![(id("A"), id("B"), 3.3)]);
    }

    #[test]
    fn insertion_order_is_canonical_iteration_order() {
        let mut net = Network::new();
        for name in ["C", "A", "B"] {
            net.add_neuron(id(name), spec(1.0, 1.0, 0.0, 0)).unwrap();
        }
        let ordered: Vec<_> = net.neuron_ids().cloned().collect();
        assert_eq!(ordered, vec![id("C"), id("A"), id("B")]);
    }

    #[test]
    fn unknown_neuron_operations_are_logged_no_ops_not_panics() {
        let mut net = Network::new();
        net.add_neuron(id("A"), spec(1.0, 1.0, 0.0, 0)).unwrap();
        net.inject_sensory(&id("ghost"), 1.0); // must not panic
        net.set_weight(&id("A"), &id("ghost"), 1.0); // must not panic
        net.set_threshold(&id("ghost"), 1.0); // must not panic
        net.remove_edge(&id("ghost"), &id("A")); // must not panic
    }
}

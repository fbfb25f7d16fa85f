//! Tick-indexed sensory event stream.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::ids::NeuronId;

/// An ordered stream of `(tick, id, value)` sensory injections, with a
/// cursor and optional wraparound, loadable from a `.seq` file.
#[derive(Debug, Clone, Default)]
pub struct InputSequence {
    events: BTreeMap<u64, Vec<(NeuronId, f32)>>,
    current_tick: u64,
    /// Informational; the parser does not enforce it.
    duration: Option<u64>,
    r#loop: bool,
}

impl InputSequence {
    /// An empty sequence, cursor at 0, looping disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cursor wraps to 0 past the last event tick.
    pub fn loop_enabled(&self) -> bool {
        self.r#loop
    }

    /// Set the wrap-around flag.
    pub fn set_loop(&mut self, enabled: bool) {
        self.r#loop = enabled;
    }

    /// Informational duration hint, if the source carried one.
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Set the informational duration hint.
    pub fn set_duration(&mut self, duration: Option<u64>) {
        self.duration = duration;
    }

    /// Every event as `(tick, id, value)`, in tick order (insertion order
    /// within a tick).
    pub fn events_in_order(&self) -> Vec<(u64, NeuronId, f32)> {
        self.events
            .iter()
            .flat_map(|(&tick, events)| events.iter().map(move |(id, value)| (tick, id.clone(), *value)))
            .collect()
    }

    /// Record an event at `tick`.
    pub fn add(&mut self, tick: u64, id: NeuronId, value: f32) {
        self.events.entry(tick).or_default().push((id, value));
    }

    /// Events due at the current cursor tick, empty if none are scheduled.
    pub fn get_current_inputs(&self) -> &[(NeuronId, f32)] {
        self.events.get(&self.current_tick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Advance the cursor by one tick, wrapping to 0 if `loop` is set and the
    /// cursor has passed the last event tick.
    pub fn advance(&mut self) {
        self.current_tick += 1;
        if self.r#loop {
            if let Some(max) = self.max_tick() {
                if self.current_tick > max {
                    self.current_tick = 0;
                }
            }
        }
    }

    /// Reset the cursor to 0.
    pub fn reset(&mut self) {
        self.current_tick = 0;
    }

    /// Current cursor position.
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Whether any event has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Highest tick with at least one event, if any.
    pub fn max_tick(&self) -> Option<u64> {
        self.events.keys().next_back().copied()
    }

    /// Parse a `.seq` file (see the persistence module for the grammar).
    /// Malformed lines are logged and skipped; a missing file is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|_| CoreError::missing_file(path.display().to_string()))?;
        Ok(crate::persistence::seq_format::parse(&text))
    }
}

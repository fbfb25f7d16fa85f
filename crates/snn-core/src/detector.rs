//! Rate-coded output readout: EMA-smoothed firing rates with argmax.

use std::collections::HashMap;

use crate::ids::NeuronId;

/// EMA-smoothed per-output firing rate with argmax prediction.
///
/// This is the trainer's readout: `evaluate` and `compute_episode_delta`
/// use [`predict`](EmaDetector::predict) and [`margin`](EmaDetector::margin)
/// directly, with no stickiness (see [`StickyDetector`] for that).
#[derive(Debug, Clone)]
pub struct EmaDetector {
    alpha: f64,
    threshold: f64,
    default_id: Option<NeuronId>,
    rates: HashMap<NeuronId, f64>,
}

impl EmaDetector {
    /// `alpha` is clamped to `(0, 1]`; `threshold` to `>= 0`.
    pub fn new(alpha: f64, threshold: f64, default_id: Option<NeuronId>) -> Self {
        Self {
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
            threshold: threshold.max(0.0),
            default_id,
            rates: HashMap::new(),
        }
    }

    /// The smoothing factor in use.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Update `id`'s rate with whether it fired this tick.
    pub fn update(&mut self, id: &NeuronId, fired: bool) {
        let rate = self.rates.entry(id.clone()).or_insert(0.0);
        *rate = (1.0 - self.alpha) * *rate + self.alpha * if fired { 1.0 } else { 0.0 };
    }

    /// Current rate for `id` (0 if never updated).
    pub fn rate(&self, id: &NeuronId) -> f64 {
        self.rates.get(id).copied().unwrap_or(0.0)
    }

    /// Reset every tracked rate to 0.
    pub fn reset(&mut self) {
        self.rates.clear();
    }

    /// Predict a winner among `ids`: the default id (possibly `None`, i.e.
    /// abstain) if the best rate is below threshold, else the argmax, ties
    /// broken by lexicographically smaller id.
    pub fn predict(&self, ids: &[NeuronId]) -> Option<NeuronId> {
        let best = Self::argmax(ids, |id| self.rate(id));
        match best {
            Some(id) if self.rate(&id) >= self.threshold => Some(id),
            _ => self.default_id.clone(),
        }
    }

    /// `rate(best) - rate(second_best)`; 0 if fewer than two ids.
    pub fn margin(&self, ids: &[NeuronId]) -> f64 {
        if ids.len() < 2 {
            return 0.0;
        }
        let mut rates: Vec<f64> = ids.iter().map(|id| self.rate(id)).collect();
        rates.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        rates[0] - rates[1]
    }

    /// The argmax of `ids` by `key`, ties broken by lexicographically
    /// smaller id. `None` if `ids` is empty.
    fn argmax(ids: &[NeuronId], key: impl Fn(&NeuronId) -> f64) -> Option<NeuronId> {
        ids.iter()
            .cloned()
            .reduce(|best, candidate| {
                let b = key(&best);
                let c = key(&candidate);
                if c > b || (c == b && candidate < best) {
                    candidate
                } else {
                    best
                }
            })
    }
}

/// A sticky-winner wrapper around [`EmaDetector`], for live readouts that
/// should not thrash between near-tied ids: the held winner is only
/// replaced once another id's rate strictly exceeds it.
#[derive(Debug, Clone)]
pub struct StickyDetector {
    inner: EmaDetector,
    held: Option<NeuronId>,
}

impl StickyDetector {
    /// Wrap an [`EmaDetector`], starting with no held winner.
    pub fn new(inner: EmaDetector) -> Self {
        Self { inner, held: None }
    }

    /// Update the underlying detector.
    pub fn update(&mut self, id: &NeuronId, fired: bool) {
        self.inner.update(id, fired);
    }

    /// The currently-held winner among `ids`, replaced only when some other
    /// id's rate strictly exceeds it.
    pub fn predict(&mut self, ids: &[NeuronId]) -> Option<NeuronId> {
        let held_rate = self.held.as_ref().map(|id| self.inner.rate(id));
        if let Some(challenger) = ids
            .iter()
            .filter(|id| held_rate.map_or(true, |hr| self.inner.rate(id) > hr))
            .reduce(|best, candidate| if self.inner.rate(candidate) > self.inner.rate(best) { candidate } else { best })
        {
            self.held = Some(challenger.clone());
        } else if self.held.is_none() {
            self.held = self.inner.predict(ids);
        }
        self.held.clone()
    }

    /// Reset both the held winner and the underlying rates.
    pub fn reset(&mut self) {
        self.inner.reset();
        self.held = None;
    }

    /// The underlying EMA detector, for direct rate/margin queries.
    pub fn inner(&self) -> &EmaDetector {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NeuronId {
        NeuronId::new(s)
    }

    #[test]
    fn ema_rate_matches_closed_form() {
        let mut d = EmaDetector::new(0.1, 0.0, None);
        for _ in 0..10 {
            d.update(&id("O0"), true);
        }
        let expected = 1.0 - (1.0 - 0.1f64).powi(10);
        assert!((d.rate(&id("O0")) - expected).abs() < 1e-12);
    }

    #[test]
    fn never_fired_rate_is_zero() {
        let mut d = EmaDetector::new(0.05, 0.2, Some(id("O0")));
        for _ in 0..100 {
            d.update(&id("O0"), false);
        }
        assert_eq!(d.rate(&id("O0")), 0.0);
    }

    #[test]
    fn abstains_below_threshold_to_default() {
        let mut d = EmaDetector::new(0.05, 0.2, Some(id("O0")));
        for _ in 0..100 {
            d.update(&id("O0"), false);
            d.update(&id("O1"), false);
        }
        assert_eq!(d.predict(&[id("O0"), id("O1")]), Some(id("O0")));
    }

    #[test]
    fn argmax_picks_highest_rate() {
        let mut d = EmaDetector::new(0.5, 0.0, None);
        d.update(&id("O0"), true);
        d.update(&id("O1"), false);
        assert_eq!(d.predict(&[id("O0"), id("O1")]), Some(id("O0")));
    }

    #[test]
    fn ties_break_lexicographically() {
        let d = EmaDetector::new(0.5, 0.0, None);
        // Neither id was ever updated, so both rates are 0: a tie.
        assert_eq!(d.predict(&[id("O1"), id("O0")]), Some(id("O0")));
    }

    #[test]
    fn margin_is_zero_with_fewer_than_two_ids() {
        let d = EmaDetector::new(0.5, 0.0, None);
        assert_eq!(d.margin(&[id("O0")]), 0.0);
        assert_eq!(d.margin(&[]), 0.0);
    }

    #[test]
    fn margin_is_best_minus_second_best() {
        let mut d = EmaDetector::new(1.0, 0.0, None);
        d.update(&id("O0"), true);
        d.update(&id("O1"), false);
        d.update(&id("O2"), false);
        assert_eq!(d.margin(&[id("O0"), id("O1"), id("O2")]), 1.0);
    }

    #[test]
    fn reset_clears_all_rates() {
        let mut d = EmaDetector::new(0.5, 0.0, None);
        d.update(&id("O0"), true);
        d.reset();
        assert_eq!(d.rate(&id("O0")), 0.0);
    }

    #[test]
    fn sticky_detector_holds_winner_until_strictly_beaten() {
        let inner = EmaDetector::new(0.5, 0.0, None);
        let mut sticky = StickyDetector::new(inner);

        sticky.update(&id("O0"), true);
        sticky.update(&id("O1"), false);
        assert_eq!(sticky.predict(&[id("O0"), id("O1")]), Some(id("O0")));

        // O1 creeps up but does not yet exceed O0: held winner unchanged.
        sticky.update(&id("O1"), true);
        sticky.update(&id("O0"), false);
        // After this update O1's rate (0.75) exceeds O0's (0.25): it flips.
        assert_eq!(sticky.predict(&[id("O0"), id("O1")]), Some(id("O1")));
    }
}

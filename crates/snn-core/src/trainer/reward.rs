//! Reward shaping: turns an episode's rates into a scalar reward.

use crate::ids::NeuronId;

use super::config::{RewardShape, TrainingConfig};

/// `r_target - max_{i != target} r_i`, treating an unresolved target as
/// `r_target = 0` (so an unknown target id yields `-max(r)`).
pub fn target_margin(rates: &[(NeuronId, f64)], target_id: &NeuronId) -> f64 {
    let r_target = rates
        .iter()
        .find(|(id, _)| id == target_id)
        .map(|(_, r)| *r)
        .unwrap_or(0.0);
    let max_other = rates
        .iter()
        .filter(|(id, _)| id != target_id)
        .map(|(_, r)| *r)
        .fold(f64::NEG_INFINITY, f64::max);
    let max_other = if max_other.is_finite() { max_other } else { 0.0 };
    r_target - max_other
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Shape `reward_raw` from the configured [`RewardShape`].
///
/// `winner` is the detector's predicted winner (possibly abstaining);
/// `margin` is `detector.margin` (best minus second-best rate, independent
/// of `target_id`); `t_margin` is [`target_margin`].
pub fn shape_reward(
    config: &TrainingConfig,
    winner: Option<&NeuronId>,
    target_id: &NeuronId,
    margin: f64,
    t_margin: f64,
) -> f64 {
    let is_confident_win = winner.is_some_and(|w| w == target_id) && margin >= config.margin_delta;
    match &config.reward_shape {
        RewardShape::Binary { reward_pos, reward_neg } => {
            if is_confident_win {
                *reward_pos
            } else {
                *reward_neg
            }
        }
        RewardShape::MarginLinear {
            reward_gain,
            reward_min,
            reward_max,
        } => (reward_gain * t_margin).clamp(*reward_min, *reward_max),
        RewardShape::SoftplusMargin { reward_gain, clamp_range } => {
            let r = sigmoid(reward_gain * (config.margin_delta - t_margin));
            match clamp_range {
                Some((lo, hi)) => r.clamp(*lo, *hi),
                None => r,
            }
        }
    }
}

/// The no-update-if-satisfied gate: zero the reward when the episode was
/// already a confident, correct win.
pub fn gate_if_satisfied(config: &TrainingConfig, reward: f64, winner: Option<&NeuronId>, target_id: &NeuronId, margin: f64) -> f64 {
    let satisfied = winner.is_some_and(|w| w == target_id) && margin >= config.margin_delta;
    if satisfied {
        0.0
    } else {
        reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NeuronId {
        NeuronId::new(s)
    }

    #[test]
    fn target_margin_uses_zero_for_unknown_target() {
        let rates = vec![(id("O0"), 0.3), (id("O1"), 0.7)];
        let m = target_margin(&rates, &id("ghost"));
        assert_eq!(m, -0.7);
    }

    #[test]
    fn target_margin_is_target_minus_best_other() {
        let rates = vec![(id("O0"), 0.8), (id("O1"), 0.3)];
        assert_eq!(target_margin(&rates, &id("O0")), 0.5);
    }

    #[test]
    fn target_margin_with_single_id_is_the_rate_itself() {
        let rates = vec![(id("O0"), 0.6)];
        assert_eq!(target_margin(&rates, &id("O0")), 0.6);
    }

    #[test]
    fn binary_reward_picks_pos_on_confident_correct_win() {
        let mut cfg = TrainingConfig::default();
        cfg.reward_shape = RewardShape::Binary {
            reward_pos: 1.0,
            reward_neg: -1.0,
        };
        cfg.margin_delta = 0.1;
        let r = shape_reward(&cfg, Some(&id("O0")), &id("O0"), 0.2, 0.2);
        assert_eq!(r, 1.0);
    }

    #[test]
    fn binary_reward_picks_neg_when_margin_too_small() {
        let mut cfg = TrainingConfig::default();
        cfg.reward_shape = RewardShape::Binary {
            reward_pos: 1.0,
            reward_neg: -1.0,
        };
        cfg.margin_delta = 0.5;
        let r = shape_reward(&cfg, Some(&id("O0")), &id("O0"), 0.2, 0.2);
        assert_eq!(r, -1.0);
    }

    #[test]
    fn margin_linear_clamps_to_range() {
        let cfg = TrainingConfig {
            reward_shape: RewardShape::MarginLinear {
                reward_gain: 10.0,
                reward_min: -1.0,
                reward_max: 1.0,
            },
            ..TrainingConfig::default()
        };
        assert_eq!(shape_reward(&cfg, None, &id("O0"), 0.0, 1.0), 1.0);
        assert_eq!(shape_reward(&cfg, None, &id("O0"), 0.0, -1.0), -1.0);
    }

    #[test]
    fn gate_zeroes_reward_when_already_satisfied() {
        let mut cfg = TrainingConfig::default();
        cfg.margin_delta = 0.1;
        let gated = gate_if_satisfied(&cfg, 0.9, Some(&id("O0")), &id("O0"), 0.2);
        assert_eq!(gated, 0.0);
    }

    #[test]
    fn gate_leaves_reward_untouched_when_not_satisfied() {
        let mut cfg = TrainingConfig::default();
        cfg.margin_delta = 0.5;
        let gated = gate_if_satisfied(&cfg, 0.9, Some(&id("O0")), &id("O0"), 0.2);
        assert_eq!(gated, 0.9);
    }
}

//! Outcome reward evaluation
//!
//! Computed once per tick from the current physical and relational state.
//! Terminal rewards are charged as if they persisted for the rest of the
//! episode: the fixed value is scaled by `time_remaining / dt_since_action`
//! so that one experience sample carries the whole remaining horizon.

use crate::config::RewardWeights;

use super::car::SpotRelation;

/// Scalar reward for the tick that just completed.
///
/// Non-terminal shape: `-dt - w_d * distance - w_a * angle/π - w_g * gutter`.
/// `dt_since_action` is the duration since the last externally-applied
/// action and must be positive.
pub fn evaluate_reward(
    collided: bool,
    parked: bool,
    relation: &SpotRelation,
    weights: &RewardWeights,
    dt_since_action: f32,
    time_remaining: f32,
) -> f32 {
    if collided {
        weights.collided * time_remaining / dt_since_action
    } else if parked {
        weights.parked * time_remaining / dt_since_action
    } else {
        -dt_since_action
            - weights.distance * relation.distance
            - weights.angle * relation.angle_distance / std::f32::consts::PI
            - weights.gutter * relation.gutter_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(distance: f32, angle: f32, gutter: f32) -> SpotRelation {
        SpotRelation {
            distance,
            angle_distance: angle,
            gutter_distance: gutter,
            ..SpotRelation::default()
        }
    }

    #[test]
    fn test_distance_only_weights() {
        // Weights (1, 0, 0) reduce the shape to -dt - distance
        let weights = RewardWeights {
            distance: 1.0,
            angle: 0.0,
            gutter: 0.0,
            ..RewardWeights::default()
        };
        let r = evaluate_reward(false, false, &relation(3.5, 1.0, 2.0), &weights, 0.1, 40.0);
        assert!((r - (-0.1 - 3.5)).abs() < 1e-6);
    }

    #[test]
    fn test_all_penalty_terms() {
        let weights = RewardWeights {
            distance: 1.0,
            angle: 32.0,
            gutter: 8.0,
            ..RewardWeights::default()
        };
        let rel = relation(2.0, std::f32::consts::PI / 2.0, 0.5);
        let r = evaluate_reward(false, false, &rel, &weights, 0.1, 40.0);
        let expected = -0.1 - 2.0 - 32.0 * 0.5 - 8.0 * 0.5;
        assert!((r - expected).abs() < 1e-4);
    }

    #[test]
    fn test_collision_charged_for_remaining_episode() {
        let weights = RewardWeights::default();
        let r = evaluate_reward(true, false, &relation(2.0, 0.0, 0.0), &weights, 0.1, 30.0);
        assert!((r - weights.collided * 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_collision_outranks_parked() {
        let weights = RewardWeights {
            parked: 5.0,
            ..RewardWeights::default()
        };
        let r = evaluate_reward(true, true, &relation(0.0, 0.0, 0.0), &weights, 0.1, 10.0);
        assert!(r < 0.0);
    }

    #[test]
    fn test_parked_scaled_like_terminal() {
        let weights = RewardWeights {
            parked: 1.0,
            ..RewardWeights::default()
        };
        let r = evaluate_reward(false, true, &relation(0.1, 0.0, 0.0), &weights, 0.5, 10.0);
        assert!((r - 20.0).abs() < 1e-5);
    }
}

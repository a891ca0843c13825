//! Reward computation for (state, action) pairs.
//!
//! The reward is a weighted base derived from the state's four levels plus
//! a per-action adjustment that favors tiers matching the inverse of
//! average performance, volume changes aligned with performance, and
//! improvement requests aimed at weak dimensions.

use crate::action::Action;
use crate::config::DimensionWeights;
use crate::state::StateKey;

#[derive(Debug, Clone, Copy)]
pub struct RewardModel {
    weights: DimensionWeights,
}

impl RewardModel {
    #[must_use]
    pub const fn new(weights: DimensionWeights) -> Self {
        Self { weights }
    }

    /// Total reward: base in [2, 10] plus the action adjustment.
    #[must_use]
    pub fn reward(&self, state: StateKey, action: Action) -> f64 {
        self.base(state) + Self::adjustment(state, action)
    }

    /// Weighted level sum scaled to [2, 10] (weights sum to 1, levels 1-5).
    #[must_use]
    pub fn base(&self, state: StateKey) -> f64 {
        (f64::from(state.quality) * self.weights.quality
            + f64::from(state.delivery) * self.weights.delivery
            + f64::from(state.price) * self.weights.price
            + f64::from(state.service) * self.weights.service)
            * 2.0
    }

    /// Per-action adjustment, a function of the state levels only.
    #[must_use]
    pub fn adjustment(state: StateKey, action: Action) -> f64 {
        let avg = state.average();

        if let Some(tier) = action.tier() {
            // Rewards tiers matching the inverse of average performance:
            // a high performer earns the most for a low tier number.
            return 5.0 - (f64::from(tier) - (6.0 - avg)).abs();
        }

        match action {
            Action::IncreaseOrderVolume => {
                if avg >= 3.5 {
                    3.0
                } else {
                    -3.0
                }
            }
            Action::DecreaseOrderVolume => {
                if avg <= 2.5 {
                    3.0
                } else {
                    -3.0
                }
            }
            Action::FlagForAudit => {
                if state.variance() >= 1.5 || avg <= 2.0 {
                    2.0
                } else {
                    -1.0
                }
            }
            Action::RequestQualityImprovement => {
                if state.quality <= 3 {
                    2.0
                } else {
                    -2.0
                }
            }
            Action::RequestDeliveryImprovement => {
                if state.delivery <= 3 {
                    2.0
                } else {
                    -2.0
                }
            }
            // Tier actions are handled above.
            _ => 0.0,
        }
    }
}

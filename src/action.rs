//! The fixed advisory action catalog.
//!
//! Ten actions in two families: tier placements (`RANK_TIER_1` = best
//! through `RANK_TIER_5` = worst) and operational directives. The catalog
//! is closed; actions are never created at runtime, and all ten are
//! available in every state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RanqError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "RANK_TIER_1")]
    RankTier1,
    #[serde(rename = "RANK_TIER_2")]
    RankTier2,
    #[serde(rename = "RANK_TIER_3")]
    RankTier3,
    #[serde(rename = "RANK_TIER_4")]
    RankTier4,
    #[serde(rename = "RANK_TIER_5")]
    RankTier5,
    #[serde(rename = "INCREASE_ORDER_VOLUME")]
    IncreaseOrderVolume,
    #[serde(rename = "DECREASE_ORDER_VOLUME")]
    DecreaseOrderVolume,
    #[serde(rename = "FLAG_FOR_AUDIT")]
    FlagForAudit,
    #[serde(rename = "REQUEST_QUALITY_IMPROVEMENT")]
    RequestQualityImprovement,
    #[serde(rename = "REQUEST_DELIVERY_IMPROVEMENT")]
    RequestDeliveryImprovement,
}

impl Action {
    pub const ALL: [Self; 10] = [
        Self::RankTier1,
        Self::RankTier2,
        Self::RankTier3,
        Self::RankTier4,
        Self::RankTier5,
        Self::IncreaseOrderVolume,
        Self::DecreaseOrderVolume,
        Self::FlagForAudit,
        Self::RequestQualityImprovement,
        Self::RequestDeliveryImprovement,
    ];

    /// Canonical wire/storage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RankTier1 => "RANK_TIER_1",
            Self::RankTier2 => "RANK_TIER_2",
            Self::RankTier3 => "RANK_TIER_3",
            Self::RankTier4 => "RANK_TIER_4",
            Self::RankTier5 => "RANK_TIER_5",
            Self::IncreaseOrderVolume => "INCREASE_ORDER_VOLUME",
            Self::DecreaseOrderVolume => "DECREASE_ORDER_VOLUME",
            Self::FlagForAudit => "FLAG_FOR_AUDIT",
            Self::RequestQualityImprovement => "REQUEST_QUALITY_IMPROVEMENT",
            Self::RequestDeliveryImprovement => "REQUEST_DELIVERY_IMPROVEMENT",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RankTier1 => "Rank the supplier as Tier 1 (Preferred)",
            Self::RankTier2 => "Rank the supplier as Tier 2 (Approved)",
            Self::RankTier3 => "Rank the supplier as Tier 3 (Conditional)",
            Self::RankTier4 => "Rank the supplier as Tier 4 (Probationary)",
            Self::RankTier5 => "Rank the supplier as Tier 5 (Not Recommended)",
            Self::IncreaseOrderVolume => {
                "Recommend increasing order volume with this supplier"
            }
            Self::DecreaseOrderVolume => {
                "Recommend decreasing order volume with this supplier"
            }
            Self::FlagForAudit => "Flag supplier for audit due to concerns",
            Self::RequestQualityImprovement => "Request supplier to improve quality",
            Self::RequestDeliveryImprovement => {
                "Request supplier to improve delivery performance"
            }
        }
    }

    /// Tier number for `RANK_TIER_n` actions, `None` for directives.
    #[must_use]
    pub const fn tier(self) -> Option<u8> {
        match self {
            Self::RankTier1 => Some(1),
            Self::RankTier2 => Some(2),
            Self::RankTier3 => Some(3),
            Self::RankTier4 => Some(4),
            Self::RankTier5 => Some(5),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| RanqError::UnknownAction(name.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

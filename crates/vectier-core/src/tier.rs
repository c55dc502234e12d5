use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fidelity tier a stored vector occupies.
///
/// Tiers are totally ordered by declaration order: `Hot < Warm < Cool < Cold < Frozen`.
/// A vector only ever moves to a strictly later tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Raw `f32` values.
    Hot,
    /// IEEE-754 half precision.
    Warm,
    /// 8-bit product quantization.
    Cool,
    /// 4-bit product quantization.
    Cold,
    /// One bit per dimension.
    Frozen,
}

impl Tier {
    /// All tiers in order, hottest first.
    pub const ALL: [Tier; 5] = [Tier::Hot, Tier::Warm, Tier::Cool, Tier::Cold, Tier::Frozen];

    /// Number of tiers.
    pub const COUNT: usize = Self::ALL.len();

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cool => "cool",
            Tier::Cold => "cold",
            Tier::Frozen => "frozen",
        }
    }

    /// Position of the tier in the total order (0 = hot).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Tier at `index` in the total order, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Successor tier, or `None` once frozen.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// True iff `to` is strictly later than `self`.
    #[must_use]
    pub fn can_transition_to(self, to: Tier) -> bool {
        to.index() > self.index()
    }

    /// True for tiers whose codec must be trained before use.
    #[must_use]
    pub fn requires_training(self) -> bool {
        matches!(self, Tier::Cool | Tier::Cold | Tier::Frozen)
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hot" => Ok(Tier::Hot),
            "warm" => Ok(Tier::Warm),
            "cool" => Ok(Tier::Cool),
            "cold" => Ok(Tier::Cold),
            "frozen" => Ok(Tier::Frozen),
            _ => Err(CoreError::invalid_config(format!("Invalid tier: {}", s))),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Position sizing module
//!
//! Win-probability estimation and fractional-Kelly sizing

mod kelly;

pub use kelly::{estimate_win_probability, kelly_size, SizeCalculator};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a candidate received a zero size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeReason {
    /// Kelly fraction was non-positive
    NoEdge,
    /// Capped size fell under the minimum position
    BelowMinimum,
}

/// Sizing decision for one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeResult {
    /// Final size in dollars, floored to cents (zero on rejection)
    pub size: Decimal,
    /// Uncapped fractional-Kelly dollars
    pub raw_kelly: Decimal,
    /// Final size as a fraction of bankroll
    pub bankroll_pct: Decimal,
    /// Present only when the size is zero
    pub reason: Option<SizeReason>,
}

/// Sizing configuration (a per-cycle snapshot of tunable parameters)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Kelly multiplier (e.g. 0.25 for quarter Kelly)
    pub kelly_fraction: Decimal,
    /// Minimum position in dollars
    pub min_position: Decimal,
    /// Maximum bet as a fraction of bankroll
    pub max_bankroll_pct: Decimal,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: Decimal::new(25, 2),
            min_position: Decimal::ONE,
            max_bankroll_pct: Decimal::new(10, 2),
        }
    }
}

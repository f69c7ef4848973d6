//! Volatility model
//!
//! Annualized realized volatility from price history, and the
//! distance-to-strike safety margin that gates every entry.

mod volatility;

pub use volatility::{compute_volatility, VolatilityAnalyzer};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trading periods per year used for annualization
pub const CRYPTO_PERIODS_PER_YEAR: f64 = 365.0;
/// Session-traded instruments (equities-style calendar)
pub const SESSION_PERIODS_PER_YEAR: f64 = 252.0;

/// Safety margin assigned when the expected move is effectively zero
pub const MARGIN_SENTINEL: f64 = 999.0;

/// Margin at or above which an entry is considered safe
pub const VALID_MARGIN: f64 = 1.5;
/// Margin at or above which an entry is risky but tradeable
pub const RISKY_MARGIN: f64 = 0.8;

/// Three-way gate recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// Safety margin >= 1.5
    Valid,
    /// Safety margin in [0.8, 1.5)
    Risky,
    /// Safety margin < 0.8, or invalid price
    Reject,
}

impl Recommendation {
    /// Map a safety margin onto the gate decision. Both thresholds are
    /// inclusive on their upper side.
    pub fn from_margin(margin: f64) -> Self {
        if margin >= VALID_MARGIN {
            Recommendation::Valid
        } else if margin >= RISKY_MARGIN {
            Recommendation::Risky
        } else {
            Recommendation::Reject
        }
    }
}

/// Result of a strike-distance analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityAnalysis {
    /// Relative distance from current price to strike, signed negative
    /// when the price is already on the unfavorable side
    pub distance_to_strike: Decimal,
    /// Expected relative move over the remaining horizon
    pub expected_move: Decimal,
    /// distance / (2 * expected_move)
    pub safety_margin: Decimal,
    /// Gate decision
    pub recommendation: Recommendation,
    /// Annualized volatility used for the analysis
    pub volatility: Decimal,
    /// Wall-clock audit timestamp
    pub computed_at: DateTime<Utc>,
}

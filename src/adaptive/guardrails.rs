//! Adjustment guardrails
//!
//! Hard preconditions that must hold before any parameter change is
//! committed, plus the drawdown circuit breaker that reverts all
//! tunables to their documented defaults.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Minimum closed trades before any adjustment is considered
pub const MIN_TOTAL_TRADES: usize = 20;

/// Cooldown between adjustments to the same parameter
pub const ADJUSTMENT_COOLDOWN_HOURS: i64 = 24;

/// Drawdown from peak at which all parameters revert to defaults
pub const DRAWDOWN_REVERT_THRESHOLD: Decimal = dec!(0.20);

/// Why an adjustment was blocked; a normal outcome, not an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailBlock {
    /// Fewer than the minimum total closed trades
    InsufficientTrades,
    /// The parameter was adjusted within the cooldown window
    CooldownActive,
}

/// Check whether a parameter may be adjusted right now.
///
/// Returns `None` when allowed, otherwise the blocking guardrail.
pub fn check_can_adjust(
    total_closed_trades: usize,
    last_adjustment: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<GuardrailBlock> {
    if total_closed_trades < MIN_TOTAL_TRADES {
        return Some(GuardrailBlock::InsufficientTrades);
    }
    if let Some(last) = last_adjustment {
        if now - last < Duration::hours(ADJUSTMENT_COOLDOWN_HOURS) {
            return Some(GuardrailBlock::CooldownActive);
        }
    }
    None
}

/// Drawdown circuit breaker: true when the bankroll sits 20% or more
/// (inclusive) below its peak. A zero or negative peak is invalid and
/// never signals a breach.
pub fn check_drawdown(current_bankroll: Decimal, peak_bankroll: Decimal) -> bool {
    if peak_bankroll <= Decimal::ZERO {
        return false;
    }
    (peak_bankroll - current_bankroll) / peak_bankroll >= DRAWDOWN_REVERT_THRESHOLD
}

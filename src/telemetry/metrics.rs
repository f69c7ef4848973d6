//! Prometheus metrics

use metrics::{counter, gauge};
use rust_decimal::Decimal;

use crate::position::{ExitReason, SkipReason};

/// Count a successful entry
pub fn record_entry(platform: &str) {
    counter!("strikegate_entries_total", "platform" => platform.to_string()).increment(1);
}

/// Count a skipped candidate by reason
pub fn record_skip(platform: &str, reason: SkipReason) {
    let reason = match reason {
        SkipReason::DuplicatePosition => "duplicate_position",
        SkipReason::InsufficientFunds => "insufficient_funds",
        SkipReason::VolatilityReject => "volatility_reject",
        SkipReason::VolatilityRisky => "volatility_risky",
        SkipReason::BelowProbabilityThreshold => "below_probability_threshold",
        SkipReason::SizingNoEdge => "sizing_no_edge",
        SkipReason::SizingBelowMinimum => "sizing_below_minimum",
    };
    counter!(
        "strikegate_skips_total",
        "platform" => platform.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Count a completed exit by reason
pub fn record_exit(platform: &str, reason: ExitReason) {
    let reason = match reason {
        ExitReason::StopLoss => "stop_loss",
        ExitReason::VolatilityExit => "volatility_exit",
        ExitReason::Resolution => "resolution",
        ExitReason::Manual => "manual",
    };
    counter!(
        "strikegate_exits_total",
        "platform" => platform.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Count a committed parameter adjustment
pub fn record_adjustment(parameter: &str) {
    counter!(
        "strikegate_parameter_adjustments_total",
        "parameter" => parameter.to_string()
    )
    .increment(1);
}

/// Current bankroll balance for a platform
pub fn set_bankroll(platform: &str, balance: Decimal) {
    let value: f64 = balance.try_into().unwrap_or(0.0);
    gauge!("strikegate_bankroll_usd", "platform" => platform.to_string()).set(value);
}

/// Number of open positions
pub fn set_open_positions(count: usize) {
    gauge!("strikegate_open_positions").set(count as f64);
}

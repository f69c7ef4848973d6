//! Bounded adjustment suggestions
//!
//! Moves a parameter toward the midpoint of its best-performing segment,
//! never by more than 10% of the current value in one step, always
//! inside the parameter's bounds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::SegmentStats;

/// Segments with fewer trades than this carry no signal
const MIN_SEGMENT_TRADES: usize = 5;

/// Maximum step as a fraction of the current value
const MAX_STEP_PCT: Decimal = dec!(0.10);

/// Suggest a new value for a parameter given its segment statistics.
///
/// Returns the current value unchanged when no segment has enough
/// trades or the current value already sits inside the best segment.
pub fn suggest_adjustment(
    current: Decimal,
    segments: &[SegmentStats],
    min: Decimal,
    max: Decimal,
) -> Decimal {
    let best = segments
        .iter()
        .filter(|s| s.trade_count >= MIN_SEGMENT_TRADES)
        .max_by(|a, b| a.score().cmp(&b.score()));

    let best = match best {
        Some(segment) => segment,
        None => return current,
    };

    if best.contains(current) {
        return current;
    }

    let target = best.midpoint();
    let max_step = (current * MAX_STEP_PCT).abs();
    let step = (target - current).clamp(-max_step, max_step);

    (current + step).clamp(min, max)
}

//! Segment-based performance attribution
//!
//! Buckets closed trades into fixed ranges of a parameter dimension and
//! aggregates win rate and P&L per bucket.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::SegmentStats;
use crate::params::names;
use crate::position::TradeOutcome;

/// Bucket edges for the entry-probability dimension
const PROBABILITY_EDGES: [Decimal; 5] =
    [dec!(0.80), dec!(0.85), dec!(0.90), dec!(0.95), dec!(1.00)];

/// Bucket edges for the safety-margin dimension
const SAFETY_MARGIN_EDGES: [Decimal; 6] =
    [dec!(0.8), dec!(1.2), dec!(1.5), dec!(2.0), dec!(2.5), dec!(5.0)];

fn dimension_value(outcome: &TradeOutcome, param: &str) -> Option<Decimal> {
    match param {
        names::MIN_PROBABILITY => Some(outcome.entry_price),
        names::SAFETY_MARGIN_FLOOR => Some(outcome.entry_safety_margin),
        _ => None,
    }
}

fn edges_for(param: &str) -> Option<&'static [Decimal]> {
    match param {
        names::MIN_PROBABILITY => Some(&PROBABILITY_EDGES),
        names::SAFETY_MARGIN_FLOOR => Some(&SAFETY_MARGIN_EDGES),
        _ => None,
    }
}

/// Bucket outcomes along the dimension belonging to `param`.
///
/// Unknown parameter names and empty inputs yield an empty result.
/// Outcomes falling outside every bucket are ignored.
pub fn analyze_by_segment(outcomes: &[TradeOutcome], param: &str) -> Vec<SegmentStats> {
    let edges = match edges_for(param) {
        Some(edges) => edges,
        None => return vec![],
    };
    if outcomes.is_empty() {
        return vec![];
    }

    let mut segments: Vec<SegmentStats> = edges
        .windows(2)
        .map(|pair| SegmentStats::empty(pair[0], pair[1]))
        .collect();

    for outcome in outcomes {
        let value = match dimension_value(outcome, param) {
            Some(v) => v,
            None => continue,
        };
        if let Some(segment) = segments.iter_mut().find(|s| s.contains(value)) {
            segment.trade_count += 1;
            if outcome.is_win() {
                segment.win_count += 1;
            } else {
                segment.loss_count += 1;
            }
            segment.total_pnl += outcome.realized_pnl;
        }
    }

    for segment in &mut segments {
        if segment.trade_count > 0 {
            let count = Decimal::from(segment.trade_count);
            segment.win_rate = Decimal::from(segment.win_count) / count;
            segment.avg_pnl = segment.total_pnl / count;
        }
    }

    segments
}

//! Adaptive parameter engine
//!
//! Buckets historical closed trades by a parameter dimension, proposes a
//! small step toward the best-performing bucket, and enforces
//! sample-size, cooldown, and drawdown guardrails before any change is
//! committed.

mod adjuster;
mod analyzer;
mod collector;
mod engine;
mod guardrails;

pub use adjuster::suggest_adjustment;
pub use analyzer::analyze_by_segment;
pub use collector::OutcomeCollector;
pub use engine::{AdaptiveAction, AdaptiveConfig, AdaptiveEngine};
pub use guardrails::{check_can_adjust, check_drawdown, GuardrailBlock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over one bucket of a parameter dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentStats {
    /// Inclusive lower bound of the bucket
    pub lower: Decimal,
    /// Exclusive upper bound of the bucket
    pub upper: Decimal,
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    /// wins / trades; zero for an empty bucket
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    /// total / trades; zero for an empty bucket
    pub avg_pnl: Decimal,
}

impl SegmentStats {
    fn empty(lower: Decimal, upper: Decimal) -> Self {
        Self {
            lower,
            upper,
            trade_count: 0,
            win_count: 0,
            loss_count: 0,
            win_rate: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            avg_pnl: Decimal::ZERO,
        }
    }

    /// Whether a value falls inside this bucket's half-open range
    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.lower && value < self.upper
    }

    /// Segment quality score: win rate, scaled up when the bucket is
    /// also profitable on average.
    pub fn score(&self) -> Decimal {
        if self.avg_pnl > Decimal::ZERO {
            self.win_rate * (Decimal::ONE + self.avg_pnl / Decimal::TEN)
        } else {
            self.win_rate
        }
    }

    /// Midpoint of the bucket range
    pub fn midpoint(&self) -> Decimal {
        (self.lower + self.upper) / Decimal::TWO
    }
}

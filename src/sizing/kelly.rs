//! Fractional-Kelly sizing for binary outcomes
//!
//! Shares pay $1 when correct, $0 when wrong, so net odds are
//! b = (1 - entry_price) / entry_price and the full-Kelly fraction is
//! f = (p*b - q) / b.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::{SizeReason, SizeResult, SizingConfig};

/// Boost applied per unit of safety margin above 1.0
const BOOST_FACTOR: Decimal = dec!(0.3);
/// Damping on the margin excess above 2.0
const DAMPING: Decimal = dec!(0.5);
/// Penalty applied per unit of safety margin below 1.0
const PENALTY_FACTOR: Decimal = dec!(0.1);

/// Estimate win probability from the market price and the safety margin.
///
/// Starts at the market-implied probability, boosted when the margin says
/// the strike is comfortably far, penalized when it is close. Bounded to
/// [price * 0.9, 1.0].
pub fn estimate_win_probability(market_price: Decimal, safety_margin: Decimal) -> Decimal {
    let mut prob = market_price;

    if safety_margin > Decimal::ONE {
        let room = Decimal::ONE - market_price;
        // Margin beyond 2.0 carries diminishing information
        let excess = if safety_margin > dec!(2) {
            Decimal::ONE + (safety_margin - dec!(2)) * DAMPING
        } else {
            safety_margin - Decimal::ONE
        };
        prob += excess * room * BOOST_FACTOR;
    } else if safety_margin < Decimal::ONE {
        prob -= (Decimal::ONE - safety_margin) * PENALTY_FACTOR;
    }

    let floor = market_price * dec!(0.9);
    prob.clamp(floor, Decimal::ONE)
}

/// Fractional-Kelly position size in dollars.
///
/// Returns zero for any invalid input or when there is no statistical
/// edge; zero is a decision, not an error.
pub fn kelly_size(
    entry_price: Decimal,
    win_prob: Decimal,
    bankroll: Decimal,
    kelly_fraction: Decimal,
) -> Decimal {
    if entry_price <= Decimal::ZERO || entry_price >= Decimal::ONE {
        return Decimal::ZERO;
    }
    if win_prob <= Decimal::ZERO || win_prob > Decimal::ONE {
        return Decimal::ZERO;
    }
    if bankroll <= Decimal::ZERO || kelly_fraction <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let b = (Decimal::ONE - entry_price) / entry_price;
    let f = (win_prob * b - (Decimal::ONE - win_prob)) / b;

    if f <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    bankroll * f * kelly_fraction
}

/// Capital-constrained size calculator
#[derive(Debug, Clone, Default)]
pub struct SizeCalculator {
    pub config: SizingConfig,
}

impl SizeCalculator {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Size one candidate: fractional Kelly, capped at the bankroll
    /// percentage limit, rejected under the minimum, floored to cents.
    pub fn calculate(
        &self,
        entry_price: Decimal,
        win_prob: Decimal,
        bankroll: Decimal,
        safety_margin: Decimal,
    ) -> SizeResult {
        let raw_kelly = kelly_size(entry_price, win_prob, bankroll, self.config.kelly_fraction);

        if raw_kelly <= Decimal::ZERO {
            tracing::debug!(
                %entry_price,
                %win_prob,
                %safety_margin,
                "Sizing found no edge"
            );
            return SizeResult {
                size: Decimal::ZERO,
                raw_kelly,
                bankroll_pct: Decimal::ZERO,
                reason: Some(SizeReason::NoEdge),
            };
        }

        let max_size = bankroll * self.config.max_bankroll_pct;
        let capped = raw_kelly.min(max_size);

        if capped < self.config.min_position {
            return SizeResult {
                size: Decimal::ZERO,
                raw_kelly,
                bankroll_pct: Decimal::ZERO,
                reason: Some(SizeReason::BelowMinimum),
            };
        }

        let size = capped.round_dp_with_strategy(2, RoundingStrategy::ToZero);
        SizeResult {
            size,
            raw_kelly,
            bankroll_pct: if bankroll > Decimal::ZERO {
                size / bankroll
            } else {
                Decimal::ZERO
            },
            reason: None,
        }
    }
}

//! Realized volatility and safety margin calculation
//!
//! Log returns over the supplied price history, Bessel-corrected sample
//! standard deviation, annualized by the instrument's trading calendar.
//! Decimal at the API boundary, f64 internally for ln/sqrt.

use chrono::Utc;
use rust_decimal::Decimal;

use super::{
    Recommendation, VolatilityAnalysis, CRYPTO_PERIODS_PER_YEAR, MARGIN_SENTINEL,
    SESSION_PERIODS_PER_YEAR,
};
use crate::position::Direction;

/// Expected moves below this are treated as zero
const EXPECTED_MOVE_EPSILON: f64 = 1e-10;

fn periods_per_year(is_crypto: bool) -> f64 {
    if is_crypto {
        CRYPTO_PERIODS_PER_YEAR
    } else {
        SESSION_PERIODS_PER_YEAR
    }
}

/// Annualized realized volatility from a price series.
///
/// Returns zero when fewer than two usable samples are supplied; the
/// caller treats that as an insufficient-data sentinel, not an error.
pub fn compute_volatility(prices: &[Decimal], is_crypto: bool) -> Decimal {
    if prices.len() < 2 {
        return Decimal::ZERO;
    }

    let mut returns: Vec<f64> = Vec::with_capacity(prices.len() - 1);
    for window in prices.windows(2) {
        let prev: f64 = window[0].try_into().unwrap_or(0.0);
        let curr: f64 = window[1].try_into().unwrap_or(0.0);
        if prev > 0.0 && curr > 0.0 {
            returns.push((curr / prev).ln());
        }
    }

    // Bessel correction needs at least two returns
    if returns.len() < 2 {
        return Decimal::ZERO;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let annualized = variance.sqrt() * periods_per_year(is_crypto).sqrt();

    Decimal::try_from(annualized).unwrap_or(Decimal::ZERO)
}

/// Strike-distance analyzer
///
/// Pure apart from the audit timestamp stamped into each result.
#[derive(Debug, Clone, Default)]
pub struct VolatilityAnalyzer;

impl VolatilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze how far the current price sits from the strike relative
    /// to the move the market can plausibly make before close.
    pub fn analyze(
        &self,
        current_price: Decimal,
        strike_price: Decimal,
        direction: Direction,
        volatility: Decimal,
        hours_to_close: f64,
        is_crypto: bool,
    ) -> VolatilityAnalysis {
        let current: f64 = current_price.try_into().unwrap_or(0.0);
        let strike: f64 = strike_price.try_into().unwrap_or(0.0);
        let vol: f64 = volatility.try_into().unwrap_or(0.0);

        if current <= 0.0 {
            return VolatilityAnalysis {
                distance_to_strike: Decimal::ZERO,
                expected_move: Decimal::ZERO,
                safety_margin: Decimal::ZERO,
                recommendation: Recommendation::Reject,
                volatility,
                computed_at: Utc::now(),
            };
        }

        let favorable = match direction {
            Direction::Above => current > strike,
            Direction::Below => current < strike,
        };
        let mut distance = (current - strike).abs() / current;
        if !favorable {
            distance = -distance;
        }

        let horizon_years = hours_to_close.max(0.0) / 24.0 / periods_per_year(is_crypto);
        let expected_move = vol * horizon_years.sqrt();

        let safety_margin = if expected_move < EXPECTED_MOVE_EPSILON {
            // Zero volatility or zero time: already favorable means the
            // outcome is locked in, otherwise it is unreachable.
            if distance >= 0.0 {
                MARGIN_SENTINEL
            } else {
                -MARGIN_SENTINEL
            }
        } else {
            (distance / (2.0 * expected_move)).clamp(-MARGIN_SENTINEL, MARGIN_SENTINEL)
        };

        let recommendation = Recommendation::from_margin(safety_margin);

        VolatilityAnalysis {
            distance_to_strike: Decimal::try_from(distance).unwrap_or(Decimal::ZERO),
            expected_move: Decimal::try_from(expected_move).unwrap_or(Decimal::ZERO),
            safety_margin: Decimal::try_from(safety_margin).unwrap_or(Decimal::ZERO),
            recommendation,
            volatility,
            computed_at: Utc::now(),
        }
    }
}

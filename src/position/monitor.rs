//! Position monitoring checks
//!
//! Stateless evaluators run per open position on each monitor tick.
//! They only report; the caller decides whether to act.

use rust_decimal::Decimal;

use super::Position;
use crate::market::MarketDataSource;
use crate::model::{compute_volatility, VolatilityAnalyzer};

/// Stop-loss breach: strictly below the threshold, so a price exactly
/// at `entry * (1 - pct)` does not trigger.
pub fn check_stop_loss(position: &Position, current_price: Decimal, stop_loss_pct: Decimal) -> bool {
    current_price < position.entry_price * (Decimal::ONE - stop_loss_pct)
}

/// Re-run the volatility analysis with current market data and trigger
/// when the fresh safety margin falls strictly below the floor,
/// regardless of unrealized profit. Collaborator failures propagate;
/// the check never substitutes a guess for a failed read.
pub async fn check_volatility_exit(
    position: &Position,
    market_data: &dyn MarketDataSource,
    analyzer: &VolatilityAnalyzer,
    hours_to_close: f64,
    margin_floor: Decimal,
    history_hours: u32,
    is_crypto: bool,
) -> anyhow::Result<bool> {
    let history = market_data.get_history(&position.asset, history_hours).await?;
    let current_price = market_data.get_price(&position.asset).await?;
    let volatility = compute_volatility(&history, is_crypto);

    let analysis = analyzer.analyze(
        current_price,
        position.strike,
        position.direction,
        volatility,
        hours_to_close,
        is_crypto,
    );

    Ok(analysis.safety_margin < margin_floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Direction, PositionStatus, Side};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    struct FixedPrices {
        spot: Decimal,
        history: Vec<Decimal>,
    }

    #[async_trait]
    impl MarketDataSource for FixedPrices {
        async fn get_price(&self, _symbol: &str) -> anyhow::Result<Decimal> {
            Ok(self.spot)
        }

        async fn get_history(&self, _symbol: &str, _hours: u32) -> anyhow::Result<Vec<Decimal>> {
            Ok(self.history.clone())
        }
    }

    struct BrokenPrices;

    #[async_trait]
    impl MarketDataSource for BrokenPrices {
        async fn get_price(&self, _symbol: &str) -> anyhow::Result<Decimal> {
            anyhow::bail!("price feed unavailable")
        }

        async fn get_history(&self, _symbol: &str, _hours: u32) -> anyhow::Result<Vec<Decimal>> {
            anyhow::bail!("history unavailable")
        }
    }

    fn make_position(entry_price: Decimal) -> Position {
        Position {
            id: Uuid::new_v4(),
            platform_id: "kalshi".to_string(),
            market_id: "BTC-90K".to_string(),
            title: "BTC above 90k".to_string(),
            asset: "BTC".to_string(),
            strike: dec!(90000),
            direction: Direction::Above,
            entry_price,
            quantity: dec!(10),
            side: Side::Yes,
            status: PositionStatus::Open,
            entry_safety_margin: dec!(1.9),
            entry_volatility: dec!(0.5),
            entry_time: Utc::now(),
        }
    }

    #[test]
    fn test_stop_loss_triggers_below_threshold() {
        let position = make_position(dec!(0.80));
        // Threshold at 20%: 0.80 * 0.80 = 0.64
        assert!(check_stop_loss(&position, dec!(0.63), dec!(0.20)));
    }

    #[test]
    fn test_stop_loss_exact_threshold_does_not_trigger() {
        let position = make_position(dec!(0.80));
        assert!(!check_stop_loss(&position, dec!(0.64), dec!(0.20)));
    }

    #[test]
    fn test_stop_loss_above_threshold_does_not_trigger() {
        let position = make_position(dec!(0.80));
        assert!(!check_stop_loss(&position, dec!(0.75), dec!(0.20)));
    }

    #[tokio::test]
    async fn test_volatility_exit_triggers_on_unfavorable_price() {
        let position = make_position(dec!(0.80));
        // Price fell through the strike: margin goes negative
        let data = FixedPrices {
            spot: dec!(85000),
            history: vec![dec!(86000), dec!(85500), dec!(85200), dec!(85000), dec!(84900)],
        };
        let triggered = check_volatility_exit(
            &position,
            &data,
            &VolatilityAnalyzer::new(),
            12.0,
            dec!(0.8),
            72,
            true,
        )
        .await
        .unwrap();
        assert!(triggered);
    }

    #[tokio::test]
    async fn test_volatility_exit_holds_when_margin_safe() {
        let position = make_position(dec!(0.80));
        // Calm market well above the strike
        let data = FixedPrices {
            spot: dec!(100000),
            history: vec![
                dec!(99900),
                dec!(100000),
                dec!(100050),
                dec!(99950),
                dec!(100020),
            ],
        };
        let triggered = check_volatility_exit(
            &position,
            &data,
            &VolatilityAnalyzer::new(),
            12.0,
            dec!(0.8),
            72,
            true,
        )
        .await
        .unwrap();
        assert!(!triggered);
    }

    #[tokio::test]
    async fn test_volatility_exit_propagates_errors() {
        let position = make_position(dec!(0.80));
        let result = check_volatility_exit(
            &position,
            &BrokenPrices,
            &VolatilityAnalyzer::new(),
            12.0,
            dec!(0.8),
            72,
            true,
        )
        .await;
        assert!(result.is_err());
    }
}

//! Closed-trade collection
//!
//! Pulls the most recently closed positions as analytics projections.

use std::sync::Arc;

use crate::position::TradeOutcome;
use crate::storage::PositionStore;

/// Collects recent closed trades for segment analysis
pub struct OutcomeCollector {
    positions: Arc<dyn PositionStore>,
    /// How many recent closed trades to analyze
    lookback: usize,
    /// Below this many total closed trades, collection yields nothing
    min_closed_trades: usize,
}

impl OutcomeCollector {
    pub fn new(positions: Arc<dyn PositionStore>, lookback: usize, min_closed_trades: usize) -> Self {
        Self {
            positions,
            lookback,
            min_closed_trades,
        }
    }

    /// The N most recent closed trades, exit time descending; empty when
    /// the total closed count is under the configured minimum.
    pub async fn collect(&self) -> anyhow::Result<Vec<TradeOutcome>> {
        let total = self.positions.count_closed().await?;
        if total < self.min_closed_trades {
            return Ok(vec![]);
        }

        let closed = self.positions.get_recent_closed(self.lookback).await?;
        Ok(closed
            .iter()
            .filter_map(TradeOutcome::from_position)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Direction, ExitReason, Position, PositionStatus, Side};
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn seed_closed(store: &MemoryStore, count: usize) {
        for i in 0..count {
            let position = Position {
                id: Uuid::new_v4(),
                platform_id: "kalshi".to_string(),
                market_id: format!("M-{i}"),
                title: "test".to_string(),
                asset: "BTC".to_string(),
                strike: dec!(90000),
                direction: Direction::Above,
                entry_price: dec!(0.85),
                quantity: dec!(10),
                side: Side::Yes,
                status: PositionStatus::Open,
                entry_safety_margin: dec!(1.8),
                entry_volatility: dec!(0.5),
                entry_time: Utc::now(),
            };
            let id = position.id;
            store.create(position).await.unwrap();
            store
                .close(
                    id,
                    dec!(1),
                    Utc::now() + chrono::Duration::seconds(i as i64),
                    ExitReason::Resolution,
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_below_minimum_yields_empty() {
        let store = MemoryStore::new();
        seed_closed(&store, 3).await;

        let collector = OutcomeCollector::new(Arc::new(store), 100, 5);
        let outcomes = collector.collect().await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_collects_up_to_lookback() {
        let store = MemoryStore::new();
        seed_closed(&store, 10).await;

        let collector = OutcomeCollector::new(Arc::new(store), 4, 5);
        let outcomes = collector.collect().await.unwrap();
        assert_eq!(outcomes.len(), 4);
    }

    #[tokio::test]
    async fn test_open_positions_excluded() {
        let store = MemoryStore::new();
        seed_closed(&store, 6).await;
        // One extra open position must not appear
        let open = Position {
            id: Uuid::new_v4(),
            platform_id: "kalshi".to_string(),
            market_id: "OPEN".to_string(),
            title: "test".to_string(),
            asset: "BTC".to_string(),
            strike: dec!(90000),
            direction: Direction::Above,
            entry_price: dec!(0.85),
            quantity: dec!(10),
            side: Side::Yes,
            status: PositionStatus::Open,
            entry_safety_margin: dec!(1.8),
            entry_volatility: dec!(0.5),
            entry_time: Utc::now(),
        };
        store.create(open).await.unwrap();

        let collector = OutcomeCollector::new(Arc::new(store), 100, 5);
        let outcomes = collector.collect().await.unwrap();
        assert_eq!(outcomes.len(), 6);
    }
}

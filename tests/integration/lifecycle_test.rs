//! Full entry-to-exit lifecycle against the in-memory backend

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use strikegate::market::{Candidate, Market, MarketDataSource};
use strikegate::params::ParamSnapshot;
use strikegate::position::{
    check_stop_loss, Direction, EntryOutcome, ExitReason, LifecycleConfig, LifecycleManager, Side,
    SkipReason,
};
use strikegate::storage::{BankrollStore, MemoryStore, PositionStore};

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

/// Gently trending series around 100k with a wide safety margin against
/// a 90k strike
fn calm_history() -> Vec<Decimal> {
    (0..48i64)
        .map(|i| {
            let wiggle = if i % 2 == 0 { 300 } else { -300 };
            dec!(100000) + Decimal::from(i * 20 + wiggle)
        })
        .collect()
}

fn candidate(yes_price: Decimal) -> Candidate {
    Candidate {
        market: Market {
            platform_id: "kalshi".to_string(),
            market_id: "BTC-90K".to_string(),
            title: "BTC above 90k".to_string(),
            asset: "BTC".to_string(),
            strike: dec!(90000),
            direction: Direction::Above,
            yes_price,
            close_time: Utc::now() + Duration::hours(24),
        },
        side: Side::Yes,
    }
}

async fn setup() -> (MemoryStore, LifecycleManager) {
    let store = MemoryStore::new();
    store.initialize("kalshi", dec!(1000)).await.unwrap();
    let manager = LifecycleManager::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(FixedPrices {
            spot: dec!(100000),
            history: calm_history(),
        }),
        LifecycleConfig::default(),
    );
    (store, manager)
}

#[tokio::test]
async fn test_entry_then_resolution_conserves_bankroll() {
    let (store, manager) = setup().await;
    let snapshot = ParamSnapshot::default();

    let details = match manager
        .process_entry(&candidate(dec!(0.90)), &snapshot, false)
        .await
        .unwrap()
    {
        EntryOutcome::Entered(d) => d,
        EntryOutcome::Skipped(r) => panic!("unexpected skip: {r:?}"),
    };

    // Debit landed
    let bankroll = store.get("kalshi").await.unwrap().unwrap();
    assert_eq!(bankroll.current, dec!(1000) - details.size);

    // Settle at full payout
    let exit = manager
        .execute_exit(details.position_id, dec!(1), ExitReason::Resolution, false)
        .await
        .unwrap();
    assert!(exit.realized_pnl > Decimal::ZERO);
    assert_eq!(
        exit.realized_pnl,
        (dec!(1) - details.entry_price) * details.quantity
    );

    // after = before - size + exit * quantity
    let bankroll = store.get("kalshi").await.unwrap().unwrap();
    assert_eq!(
        bankroll.current,
        dec!(1000) - details.size + dec!(1) * details.quantity
    );

    assert!(store.get_open().await.unwrap().is_empty());
    assert_eq!(store.count_closed().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reentry_allowed_after_close() {
    let (store, manager) = setup().await;
    let snapshot = ParamSnapshot::default();

    let first = match manager
        .process_entry(&candidate(dec!(0.90)), &snapshot, false)
        .await
        .unwrap()
    {
        EntryOutcome::Entered(d) => d,
        EntryOutcome::Skipped(r) => panic!("unexpected skip: {r:?}"),
    };

    // Duplicate blocked while open
    let blocked = manager
        .process_entry(&candidate(dec!(0.90)), &snapshot, false)
        .await
        .unwrap();
    assert!(matches!(
        blocked,
        EntryOutcome::Skipped(SkipReason::DuplicatePosition)
    ));

    // Close frees the market for a new entry
    manager
        .execute_exit(first.position_id, dec!(1), ExitReason::Resolution, false)
        .await
        .unwrap();
    let reentry = manager
        .process_entry(&candidate(dec!(0.90)), &snapshot, false)
        .await
        .unwrap();
    assert!(reentry.is_entered());

    assert_eq!(store.get_open().await.unwrap().len(), 1);
    assert_eq!(store.count_closed().await.unwrap(), 1);
}

#[tokio::test]
async fn test_stop_loss_exit_realizes_loss() {
    let (store, manager) = setup().await;
    let snapshot = ParamSnapshot::default();

    let details = match manager
        .process_entry(&candidate(dec!(0.90)), &snapshot, false)
        .await
        .unwrap()
    {
        EntryOutcome::Entered(d) => d,
        EntryOutcome::Skipped(r) => panic!("unexpected skip: {r:?}"),
    };

    // Quote collapses well past the 20% stop
    let mark = dec!(0.50);
    let position = store
        .get_by_id(details.position_id)
        .await
        .unwrap()
        .unwrap();
    assert!(check_stop_loss(&position, mark, snapshot.stop_loss_pct));

    let exit = manager
        .execute_exit(details.position_id, mark, ExitReason::StopLoss, false)
        .await
        .unwrap();
    assert!(exit.realized_pnl < Decimal::ZERO);

    // The loss is exactly the quote drop times quantity
    let bankroll = store.get("kalshi").await.unwrap().unwrap();
    assert_eq!(
        bankroll.current,
        dec!(1000) - details.size + mark * details.quantity
    );
}

#[tokio::test]
async fn test_double_close_rejected() {
    let (_store, manager) = setup().await;
    let details = match manager
        .process_entry(&candidate(dec!(0.90)), &ParamSnapshot::default(), false)
        .await
        .unwrap()
    {
        EntryOutcome::Entered(d) => d,
        EntryOutcome::Skipped(r) => panic!("unexpected skip: {r:?}"),
    };

    manager
        .execute_exit(details.position_id, dec!(1), ExitReason::Resolution, false)
        .await
        .unwrap();
    let second = manager
        .execute_exit(details.position_id, dec!(0.5), ExitReason::Manual, false)
        .await;
    assert!(second.is_err());
}

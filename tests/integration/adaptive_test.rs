//! Adaptive engine passes against the in-memory backend

use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

use strikegate::adaptive::{AdaptiveAction, AdaptiveConfig, AdaptiveEngine, GuardrailBlock};
use strikegate::params::{default_parameters, names, ParamSnapshot};
use strikegate::position::{Direction, ExitReason, Position, PositionStatus, Side};
use strikegate::storage::{BankrollStore, MemoryStore, ParameterStore, PositionStore};

/// Close `count` trades; even indices win in the [0.90, 0.95) entry
/// bucket, odd indices lose in [0.80, 0.85).
async fn seed_trades(store: &MemoryStore, count: usize) {
    for i in 0..count {
        let (entry_price, exit_price) = if i % 2 == 0 {
            (dec!(0.92), dec!(1))
        } else {
            (dec!(0.82), dec!(0))
        };
        let position = Position {
            id: Uuid::new_v4(),
            platform_id: "kalshi".to_string(),
            market_id: format!("M-{i}"),
            title: "seed".to_string(),
            asset: "BTC".to_string(),
            strike: dec!(90000),
            direction: Direction::Above,
            entry_price,
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
                exit_price,
                Utc::now() + chrono::Duration::seconds(i as i64),
                ExitReason::Resolution,
            )
            .await
            .unwrap();
    }
}

async fn engine(store: &MemoryStore) -> AdaptiveEngine {
    for parameter in default_parameters() {
        ParameterStore::save(store, parameter).await.unwrap();
    }
    AdaptiveEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        AdaptiveConfig {
            lookback: 100,
            min_closed_trades: 10,
            platforms: vec!["kalshi".to_string()],
        },
    )
}

#[tokio::test]
async fn test_guardrail_blocks_thin_history() {
    let store = MemoryStore::new();
    store.initialize("kalshi", dec!(1000)).await.unwrap();
    seed_trades(&store, 10).await;
    let mut engine = engine(&store).await;

    let action = engine.run_once().await.unwrap();
    assert_eq!(
        action,
        AdaptiveAction::Blocked(GuardrailBlock::InsufficientTrades)
    );

    // Nothing moved
    let parameter = store
        .get_by_name(names::MIN_PROBABILITY)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(parameter.value, dec!(0.80));
}

#[tokio::test]
async fn test_adjustment_flows_into_snapshot() {
    let store = MemoryStore::new();
    store.initialize("kalshi", dec!(1000)).await.unwrap();
    seed_trades(&store, 30).await;
    let mut engine = engine(&store).await;

    let action = engine.run_once().await.unwrap();
    let (old_value, new_value) = match action {
        AdaptiveAction::Adjusted {
            parameter,
            old_value,
            new_value,
        } => {
            assert_eq!(parameter, names::MIN_PROBABILITY);
            (old_value, new_value)
        }
        other => panic!("expected adjustment, got {other:?}"),
    };

    // Step capped at 10% of the old value, inside the bounds
    assert!(new_value > old_value);
    assert!(new_value - old_value <= old_value * dec!(0.10));
    assert!(new_value <= dec!(0.95));

    // The next cycle's snapshot sees the tuned value
    let snapshot = ParamSnapshot::from_parameters(&store.get_current().await.unwrap());
    assert_eq!(snapshot.min_probability, new_value);

    // The change is auditable
    let history = store.get_history(names::MIN_PROBABILITY).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_value, old_value);
    assert_eq!(history[0].new_value, new_value);
}

#[tokio::test]
async fn test_drawdown_reverts_tuned_parameters() {
    let store = MemoryStore::new();
    store.initialize("kalshi", dec!(1000)).await.unwrap();
    seed_trades(&store, 30).await;
    let mut engine = engine(&store).await;

    let first = engine.run_once().await.unwrap();
    assert!(matches!(first, AdaptiveAction::Adjusted { .. }));

    // A 25% drawdown from the observed peak trips the breaker
    store.add_to_balance("kalshi", dec!(-250)).await.unwrap();
    let action = engine.run_once().await.unwrap();
    assert_eq!(action, AdaptiveAction::Reverted);

    let snapshot = ParamSnapshot::from_parameters(&store.get_current().await.unwrap());
    assert_eq!(snapshot.min_probability, dec!(0.80));
    assert_eq!(snapshot.safety_margin_floor, dec!(0.8));
    assert_eq!(snapshot.stop_loss_pct, dec!(0.20));
    assert_eq!(snapshot.kelly_fraction, dec!(0.25));
}

#[tokio::test]
async fn test_shallow_drawdown_does_not_revert() {
    let store = MemoryStore::new();
    store.initialize("kalshi", dec!(1000)).await.unwrap();
    seed_trades(&store, 30).await;
    let mut engine = engine(&store).await;

    let first = engine.run_once().await.unwrap();
    assert!(matches!(first, AdaptiveAction::Adjusted { .. }));
    let tuned = store
        .get_by_name(names::MIN_PROBABILITY)
        .await
        .unwrap()
        .unwrap()
        .value;

    // 10% down from peak: breaker stays quiet, tuned value survives
    store.add_to_balance("kalshi", dec!(-100)).await.unwrap();
    let action = engine.run_once().await.unwrap();
    assert_ne!(action, AdaptiveAction::Reverted);
    let still = store
        .get_by_name(names::MIN_PROBABILITY)
        .await
        .unwrap()
        .unwrap()
        .value;
    assert_eq!(still, tuned);
}

//! In-memory storage backend
//!
//! Backs paper trading and tests. Every map sits behind one `RwLock` per
//! store so single-call updates are atomic, matching the storage contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Bankroll, BankrollStore, ParameterStore, PositionStore};
use crate::params::{Parameter, ParameterChange};
use crate::position::{ExitReason, Position, PositionError, PositionStatus};

/// In-memory implementation of all three store traits
#[derive(Clone, Default)]
pub struct MemoryStore {
    positions: Arc<RwLock<HashMap<Uuid, Position>>>,
    bankrolls: Arc<RwLock<HashMap<String, Bankroll>>>,
    parameters: Arc<RwLock<ParameterState>>,
}

#[derive(Default)]
struct ParameterState {
    values: HashMap<String, Parameter>,
    history: HashMap<String, Vec<ParameterChange>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn create(&self, position: Position) -> anyhow::Result<()> {
        let mut positions = self.positions.write().await;
        positions.insert(position.id, position);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Position>> {
        let positions = self.positions.read().await;
        Ok(positions.get(&id).cloned())
    }

    async fn get_open_by_market(
        &self,
        platform_id: &str,
        market_id: &str,
    ) -> anyhow::Result<Option<Position>> {
        let positions = self.positions.read().await;
        Ok(positions
            .values()
            .find(|p| p.is_open() && p.platform_id == platform_id && p.market_id == market_id)
            .cloned())
    }

    async fn get_open(&self) -> anyhow::Result<Vec<Position>> {
        let positions = self.positions.read().await;
        Ok(positions.values().filter(|p| p.is_open()).cloned().collect())
    }

    async fn get_recent_closed(&self, limit: usize) -> anyhow::Result<Vec<Position>> {
        let positions = self.positions.read().await;
        let mut closed: Vec<Position> = positions
            .values()
            .filter(|p| !p.is_open())
            .cloned()
            .collect();
        closed.sort_by_key(|p| match &p.status {
            PositionStatus::Closed(record) => std::cmp::Reverse(record.exit_time),
            PositionStatus::Open => std::cmp::Reverse(DateTime::<Utc>::MIN_UTC),
        });
        closed.truncate(limit);
        Ok(closed)
    }

    async fn count_closed(&self) -> anyhow::Result<usize> {
        let positions = self.positions.read().await;
        Ok(positions.values().filter(|p| !p.is_open()).count())
    }

    async fn close(
        &self,
        id: Uuid,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
    ) -> anyhow::Result<Position> {
        let mut positions = self.positions.write().await;
        let position = positions
            .get_mut(&id)
            .ok_or(PositionError::NotFound(id))?;
        position.close(exit_price, exit_time, exit_reason)?;
        Ok(position.clone())
    }
}

#[async_trait]
impl BankrollStore for MemoryStore {
    async fn get(&self, platform_id: &str) -> anyhow::Result<Option<Bankroll>> {
        let bankrolls = self.bankrolls.read().await;
        Ok(bankrolls.get(platform_id).cloned())
    }

    async fn initialize(&self, platform_id: &str, amount: Decimal) -> anyhow::Result<()> {
        let mut bankrolls = self.bankrolls.write().await;
        bankrolls.entry(platform_id.to_string()).or_insert(Bankroll {
            platform_id: platform_id.to_string(),
            initial: amount,
            current: amount,
        });
        Ok(())
    }

    async fn add_to_balance(&self, platform_id: &str, delta: Decimal) -> anyhow::Result<Decimal> {
        let mut bankrolls = self.bankrolls.write().await;
        let bankroll = bankrolls
            .get_mut(platform_id)
            .ok_or_else(|| anyhow::anyhow!("Bankroll not initialized: {platform_id}"))?;
        bankroll.current += delta;
        Ok(bankroll.current)
    }
}

#[async_trait]
impl ParameterStore for MemoryStore {
    async fn get_current(&self) -> anyhow::Result<Vec<Parameter>> {
        let state = self.parameters.read().await;
        Ok(state.values.values().cloned().collect())
    }

    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Parameter>> {
        let state = self.parameters.read().await;
        Ok(state.values.get(name).cloned())
    }

    async fn save(&self, parameter: Parameter) -> anyhow::Result<()> {
        let mut state = self.parameters.write().await;
        state.values.insert(parameter.name.clone(), parameter);
        Ok(())
    }

    async fn save_with_reason(
        &self,
        name: &str,
        new_value: Decimal,
        reason: &str,
    ) -> anyhow::Result<()> {
        // One write guard covers the value update and the history append
        let mut state = self.parameters.write().await;
        let parameter = state
            .values
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown parameter: {name}"))?;

        let clamped = new_value.clamp(parameter.min, parameter.max);
        let change = ParameterChange {
            parameter: name.to_string(),
            old_value: parameter.value,
            new_value: clamped,
            reason: reason.to_string(),
            at: Utc::now(),
        };
        parameter.value = clamped;
        parameter.updated_at = change.at;
        state.history.entry(name.to_string()).or_default().push(change);
        Ok(())
    }

    async fn get_history(&self, name: &str) -> anyhow::Result<Vec<ParameterChange>> {
        let state = self.parameters.read().await;
        let mut history = state.history.get(name).cloned().unwrap_or_default();
        history.reverse();
        Ok(history)
    }

    async fn last_adjustment_time(
        &self,
        name: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let state = self.parameters.read().await;
        Ok(state
            .history
            .get(name)
            .and_then(|entries| entries.last())
            .map(|entry| entry.at))
    }
}

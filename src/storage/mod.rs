//! Storage collaborator contracts
//!
//! The core reads and writes positions, bankrolls, and parameters through
//! these traits. Persistence formatting is entirely the implementor's
//! concern; the contract requires at-least atomic single-row updates, and
//! `save_with_reason` must commit the value update and its history entry
//! as one unit.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::params::{Parameter, ParameterChange};
use crate::position::{ExitReason, Position};

/// One capital ledger per platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bankroll {
    pub platform_id: String,
    /// Immutable baseline set at initialization
    pub initial: Decimal,
    /// Mutable balance; written only by the lifecycle debit/credit
    pub current: Decimal,
}

/// Position persistence
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Insert a new open position
    async fn create(&self, position: Position) -> anyhow::Result<()>;
    /// Fetch a position by id
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Position>>;
    /// Fetch the open position for a (platform, market) pair, if any
    async fn get_open_by_market(
        &self,
        platform_id: &str,
        market_id: &str,
    ) -> anyhow::Result<Option<Position>>;
    /// All open positions
    async fn get_open(&self) -> anyhow::Result<Vec<Position>>;
    /// The most recently closed positions, exit time descending
    async fn get_recent_closed(&self, limit: usize) -> anyhow::Result<Vec<Position>>;
    /// Total number of closed positions
    async fn count_closed(&self) -> anyhow::Result<usize>;
    /// Apply the open -> closed transition and return the closed position
    async fn close(
        &self,
        id: Uuid,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
    ) -> anyhow::Result<Position>;
}

/// Bankroll persistence
#[async_trait]
pub trait BankrollStore: Send + Sync {
    /// Fetch the ledger for a platform
    async fn get(&self, platform_id: &str) -> anyhow::Result<Option<Bankroll>>;
    /// Create the ledger with its immutable baseline (idempotent)
    async fn initialize(&self, platform_id: &str, amount: Decimal) -> anyhow::Result<()>;
    /// Atomically add a (possibly negative) delta; returns the new balance
    async fn add_to_balance(&self, platform_id: &str, delta: Decimal) -> anyhow::Result<Decimal>;
}

/// Parameter persistence
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// All current parameters
    async fn get_current(&self) -> anyhow::Result<Vec<Parameter>>;
    /// One parameter by name
    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Parameter>>;
    /// Upsert a parameter without recording history (bootstrap/revert)
    async fn save(&self, parameter: Parameter) -> anyhow::Result<()>;
    /// Update a parameter value and append its history entry as one
    /// atomic unit; a failure must leave both unchanged
    async fn save_with_reason(
        &self,
        name: &str,
        new_value: Decimal,
        reason: &str,
    ) -> anyhow::Result<()>;
    /// Full adjustment history for a parameter, newest first
    async fn get_history(&self, name: &str) -> anyhow::Result<Vec<ParameterChange>>;
    /// Timestamp of the most recent adjustment to a parameter
    async fn last_adjustment_time(&self, name: &str)
        -> anyhow::Result<Option<DateTime<Utc>>>;
}

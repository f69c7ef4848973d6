//! Position domain types
//!
//! Positions move through exactly one transition: open -> closed. The
//! status is a tagged enum carrying the exit snapshot, so a reopened or
//! double-closed position cannot be represented.

mod manager;
mod monitor;

pub use manager::{
    EntryDetails, EntryOutcome, ExitOutcome, LifecycleConfig, LifecycleManager, SkipReason,
};
pub use monitor::{check_stop_loss, check_volatility_exit};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Resolution direction relative to the strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Resolves Yes when the asset settles above the strike
    Above,
    /// Resolves Yes when the asset settles below the strike
    Below,
}

/// Which outcome token the position holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Price fell below the stop-loss threshold
    StopLoss,
    /// Re-evaluated safety margin dropped below the floor
    VolatilityExit,
    /// Market settled
    Resolution,
    /// Operator-initiated close
    Manual,
}

/// Exit snapshot recorded on the one open -> closed transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub exit_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub exit_reason: ExitReason,
    pub realized_pnl: Decimal,
}

/// Position status as a tagged variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed(ExitRecord),
}

/// Position errors (validation class, never retried)
#[derive(Debug, Error)]
pub enum PositionError {
    /// No position exists with the given id
    #[error("Position not found: {0}")]
    NotFound(Uuid),
    /// The position has already been closed
    #[error("Position already closed: {0}")]
    AlreadyClosed(Uuid),
    /// Entry price must lie strictly inside (0, 1)
    #[error("Entry price out of range: {0}")]
    EntryPriceOutOfRange(Decimal),
    /// Quantity must be positive
    #[error("Quantity must be positive: {0}")]
    NonPositiveQuantity(Decimal),
}

/// One attempted/realized trade
///
/// Entry-captured fields are set once at creation and have no mutators;
/// the only state change is the `close` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Position identifier
    pub id: Uuid,
    /// Venue the position trades on
    pub platform_id: String,
    /// Venue market identifier
    pub market_id: String,
    /// Market title
    pub title: String,
    /// Underlying asset symbol
    pub asset: String,
    /// Strike price
    pub strike: Decimal,
    /// Resolution direction
    pub direction: Direction,
    /// Entry price, strictly in (0, 1)
    pub entry_price: Decimal,
    /// Contract quantity, > 0
    pub quantity: Decimal,
    /// Outcome token held
    pub side: Side,
    /// Open or closed with exit snapshot
    pub status: PositionStatus,
    /// Safety margin at entry
    pub entry_safety_margin: Decimal,
    /// Annualized volatility at entry
    pub entry_volatility: Decimal,
    /// Entry timestamp
    pub entry_time: DateTime<Utc>,
}

impl Position {
    /// Whether the position is still open
    pub fn is_open(&self) -> bool {
        matches!(self.status, PositionStatus::Open)
    }

    /// Capital committed at entry
    pub fn cost_basis(&self) -> Decimal {
        self.entry_price * self.quantity
    }

    /// Apply the single allowed transition, recording the exit snapshot.
    ///
    /// Realized P&L is `(exit - entry) * quantity`.
    pub fn close(
        &mut self,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
    ) -> Result<ExitRecord, PositionError> {
        if !self.is_open() {
            return Err(PositionError::AlreadyClosed(self.id));
        }
        let record = ExitRecord {
            exit_price,
            exit_time,
            exit_reason,
            realized_pnl: (exit_price - self.entry_price) * self.quantity,
        };
        self.status = PositionStatus::Closed(record.clone());
        Ok(record)
    }
}

/// Read-only projection of a closed position used for analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub platform_id: String,
    pub asset: String,
    pub strike: Decimal,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub realized_pnl: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub exit_reason: ExitReason,
    pub entry_safety_margin: Decimal,
    pub entry_volatility: Decimal,
}

impl TradeOutcome {
    /// Project a closed position; returns None while the position is open.
    pub fn from_position(position: &Position) -> Option<Self> {
        let exit = match &position.status {
            PositionStatus::Closed(record) => record,
            PositionStatus::Open => return None,
        };
        Some(Self {
            platform_id: position.platform_id.clone(),
            asset: position.asset.clone(),
            strike: position.strike,
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price: exit.exit_price,
            quantity: position.quantity,
            realized_pnl: exit.realized_pnl,
            entry_time: position.entry_time,
            exit_time: exit.exit_time,
            exit_reason: exit.exit_reason,
            entry_safety_margin: position.entry_safety_margin,
            entry_volatility: position.entry_volatility,
        })
    }

    /// Win = strictly positive realized P&L
    pub fn is_win(&self) -> bool {
        self.realized_pnl > Decimal::ZERO
    }
}

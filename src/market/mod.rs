//! Market and candidate types
//!
//! Normalized market data consumed by the core, plus the collaborator
//! traits for price feeds and trading venues. The core never touches raw
//! venue payloads; candidate discovery lives behind these seams.

pub mod sim;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::position::{Direction, Side};

/// A normalized binary strike market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Venue the market trades on
    pub platform_id: String,
    /// Venue-unique market identifier
    pub market_id: String,
    /// Human-readable title
    pub title: String,
    /// Underlying asset symbol (e.g. "BTC")
    pub asset: String,
    /// Strike price the market resolves against
    pub strike: Decimal,
    /// Resolution direction (above/below strike)
    pub direction: Direction,
    /// Market-implied probability of the Yes outcome
    pub yes_price: Decimal,
    /// Market close/settlement time
    pub close_time: DateTime<Utc>,
}

/// A candidate entry produced by market discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// The market to enter
    pub market: Market,
    /// Which outcome to buy
    pub side: Side,
}

impl Candidate {
    /// Entry price for the chosen side, inverting the implied probability
    /// when buying the No outcome.
    pub fn entry_price(&self) -> Decimal {
        match self.side {
            Side::Yes => self.market.yes_price,
            Side::No => Decimal::ONE - self.market.yes_price,
        }
    }

    /// Hours remaining until market close, clamped to zero
    pub fn hours_to_close(&self, now: DateTime<Utc>) -> f64 {
        let secs = (self.market.close_time - now).num_seconds();
        (secs.max(0) as f64) / 3600.0
    }
}

/// Filter passed to market discovery
#[derive(Debug, Clone, Default)]
pub struct MarketFilter {
    /// Restrict to a single asset symbol
    pub asset: Option<String>,
    /// Only markets closing within this many hours
    pub max_hours_to_close: Option<f64>,
}

/// A position as reported by the venue (reconciliation only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenuePosition {
    pub market_id: String,
    pub side: Side,
    pub quantity: Decimal,
    pub avg_price: Decimal,
}

/// Trait for spot price providers
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current spot price for a symbol
    async fn get_price(&self, symbol: &str) -> anyhow::Result<Decimal>;
    /// Hourly price history for a symbol, oldest first
    async fn get_history(&self, symbol: &str, hours: u32) -> anyhow::Result<Vec<Decimal>>;
}

/// Trait for trading venue clients (one per platform)
#[async_trait]
pub trait TradingVenue: Send + Sync {
    /// List tradeable markets matching a filter
    async fn list_markets(&self, filter: &MarketFilter) -> anyhow::Result<Vec<Market>>;
    /// Available balance in dollars
    async fn get_balance(&self) -> anyhow::Result<Decimal>;
    /// Positions currently held at the venue
    async fn get_positions(&self) -> anyhow::Result<Vec<VenuePosition>>;
}

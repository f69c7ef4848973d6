//! Simulated market feed for paper trading
//!
//! Deterministic price paths and synthetic strike markets so the full
//! entry/monitor/adaptive loop can run without a venue connection.
//! Prices wobble around a configured base using a hash of the symbol
//! and the hour index, so history and spot always agree.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{Market, MarketDataSource, MarketFilter, TradingVenue, VenuePosition};
use crate::position::Direction;

/// Distance of the synthetic strike below spot, as a fraction
const STRIKE_OFFSET_PCT: f64 = 0.08;

/// Implied probability quoted on every synthetic market
const SYNTHETIC_YES_PRICE: Decimal = rust_decimal_macros::dec!(0.90);

/// Paper-mode feed and venue backed by deterministic price paths
pub struct SimulatedFeed {
    platform_id: String,
    base_prices: HashMap<String, Decimal>,
    /// Peak-to-base wobble as a fraction of the base price
    wobble_pct: f64,
    balance: Decimal,
}

impl SimulatedFeed {
    pub fn new(platform_id: impl Into<String>, balance: Decimal) -> Self {
        let mut base_prices = HashMap::new();
        base_prices.insert("BTC".to_string(), Decimal::new(100_000, 0));
        base_prices.insert("ETH".to_string(), Decimal::new(4_000, 0));
        Self {
            platform_id: platform_id.into(),
            base_prices,
            wobble_pct: 0.003,
            balance,
        }
    }

    pub fn with_base_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.base_prices.insert(symbol.into(), price);
        self
    }

    fn base_price(&self, symbol: &str) -> anyhow::Result<Decimal> {
        self.base_prices
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("No simulated price path for symbol {}", symbol))
    }

    /// Price at an absolute hour index
    fn price_at(&self, base: Decimal, symbol: &str, hour_index: i64) -> Decimal {
        let seed = symbol
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
            .wrapping_add(hour_index as u64);
        let factor = 1.0 + self.wobble_pct * noise(seed);
        base * Decimal::from_f64(factor).unwrap_or(Decimal::ONE)
    }

    fn current_hour() -> i64 {
        Utc::now().timestamp() / 3600
    }
}

/// Pseudo-random value in [-1, 1], stable for a given seed
fn noise(seed: u64) -> f64 {
    let mut x = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    ((x % 10_000) as f64 / 10_000.0) * 2.0 - 1.0
}

#[async_trait]
impl MarketDataSource for SimulatedFeed {
    async fn get_price(&self, symbol: &str) -> anyhow::Result<Decimal> {
        let base = self.base_price(symbol)?;
        Ok(self.price_at(base, symbol, Self::current_hour()))
    }

    async fn get_history(&self, symbol: &str, hours: u32) -> anyhow::Result<Vec<Decimal>> {
        let base = self.base_price(symbol)?;
        let now = Self::current_hour();
        let start = now - hours as i64 + 1;
        Ok((start..=now)
            .map(|h| self.price_at(base, symbol, h))
            .collect())
    }
}

#[async_trait]
impl TradingVenue for SimulatedFeed {
    async fn list_markets(&self, filter: &MarketFilter) -> anyhow::Result<Vec<Market>> {
        let close_hours = filter.max_hours_to_close.unwrap_or(24.0).min(24.0);
        let mut markets = vec![];
        for symbol in self.base_prices.keys() {
            if let Some(asset) = &filter.asset {
                if asset != symbol {
                    continue;
                }
            }
            let spot = self.get_price(symbol).await?;
            let strike = (spot * Decimal::from_f64(1.0 - STRIKE_OFFSET_PCT).unwrap_or(Decimal::ONE))
                .round_dp(0);
            markets.push(Market {
                platform_id: self.platform_id.clone(),
                market_id: format!("{}-{}", symbol, strike),
                title: format!("{} above {} at close", symbol, strike),
                asset: symbol.clone(),
                strike,
                direction: Direction::Above,
                yes_price: SYNTHETIC_YES_PRICE,
                close_time: Utc::now() + Duration::minutes((close_hours * 60.0) as i64),
            });
        }
        Ok(markets)
    }

    async fn get_balance(&self) -> anyhow::Result<Decimal> {
        Ok(self.balance)
    }

    async fn get_positions(&self) -> anyhow::Result<Vec<VenuePosition>> {
        Ok(vec![])
    }
}

//! Position lifecycle manager
//!
//! The single mutation surface for position state. Entry runs the gate
//! chain (duplicate, funds, volatility, probability, sizing) and commits
//! exactly one position insert plus one bankroll debit; exit computes the
//! realized P&L and credits the raw proceeds back. No writes happen on
//! any skip path.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{ExitReason, Position, PositionError, PositionStatus};
use crate::market::{Candidate, MarketDataSource};
use crate::model::{compute_volatility, Recommendation, VolatilityAnalyzer};
use crate::params::ParamSnapshot;
use crate::sizing::{SizeCalculator, SizeReason, SizingConfig};
use crate::storage::{BankrollStore, PositionStore};
use crate::telemetry;

/// Why a candidate was skipped; normal outcomes, not errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An open position already exists for this (platform, market)
    DuplicatePosition,
    /// Bankroll missing, depleted, or too small for the debit
    InsufficientFunds,
    /// Volatility gate recommended reject
    VolatilityReject,
    /// Volatility gate recommended risky and risky mode is off
    VolatilityRisky,
    /// Estimated win probability under the tunable threshold
    BelowProbabilityThreshold,
    /// Kelly found no statistical edge
    SizingNoEdge,
    /// Capped size under the minimum position
    SizingBelowMinimum,
}

/// Successful entry details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDetails {
    pub position_id: Uuid,
    pub size: Decimal,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub safety_margin: Decimal,
    pub volatility: Decimal,
    pub win_probability: Decimal,
}

/// Outcome of one entry attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntryOutcome {
    Entered(EntryDetails),
    Skipped(SkipReason),
}

impl EntryOutcome {
    pub fn is_entered(&self) -> bool {
        matches!(self, EntryOutcome::Entered(_))
    }
}

/// Outcome of a completed exit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitOutcome {
    pub position_id: Uuid,
    pub exit_price: Decimal,
    pub exit_reason: ExitReason,
    pub realized_pnl: Decimal,
    pub entry_price: Decimal,
    pub quantity: Decimal,
}

/// Static (non-adaptive) lifecycle configuration
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Accept risky volatility recommendations
    pub allow_risky: bool,
    /// Hours of price history fed into the volatility estimate
    pub history_hours: u32,
    /// Minimum position in dollars
    pub min_position: Decimal,
    /// Maximum bet as a fraction of bankroll
    pub max_bankroll_pct: Decimal,
    /// Assets on a session-traded calendar (252 periods); everything
    /// else annualizes as continuously traded (365)
    pub session_assets: Vec<String>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            allow_risky: false,
            history_hours: 72,
            min_position: Decimal::ONE,
            max_bankroll_pct: Decimal::new(10, 2),
            session_assets: vec![],
        }
    }
}

/// Orchestrates entries and exits against the storage collaborators
pub struct LifecycleManager {
    positions: Arc<dyn PositionStore>,
    bankrolls: Arc<dyn BankrollStore>,
    market_data: Arc<dyn MarketDataSource>,
    analyzer: VolatilityAnalyzer,
    config: LifecycleConfig,
}

impl LifecycleManager {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        bankrolls: Arc<dyn BankrollStore>,
        market_data: Arc<dyn MarketDataSource>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            positions,
            bankrolls,
            market_data,
            analyzer: VolatilityAnalyzer::new(),
            config,
        }
    }

    fn is_crypto(&self, asset: &str) -> bool {
        !self.config.session_assets.iter().any(|a| a == asset)
    }

    /// Attempt to enter a candidate. Collaborator failures propagate;
    /// gate rejections come back as `EntryOutcome::Skipped`.
    pub async fn process_entry(
        &self,
        candidate: &Candidate,
        snapshot: &ParamSnapshot,
        dry_run: bool,
    ) -> anyhow::Result<EntryOutcome> {
        let market = &candidate.market;

        if self
            .positions
            .get_open_by_market(&market.platform_id, &market.market_id)
            .await?
            .is_some()
        {
            return Ok(self.skip(market, SkipReason::DuplicatePosition));
        }

        let bankroll = match self.bankrolls.get(&market.platform_id).await? {
            Some(b) if b.current > Decimal::ZERO => b,
            _ => return Ok(self.skip(market, SkipReason::InsufficientFunds)),
        };

        let history = self
            .market_data
            .get_history(&market.asset, self.config.history_hours)
            .await?;
        let current_price = self.market_data.get_price(&market.asset).await?;
        let is_crypto = self.is_crypto(&market.asset);
        let volatility = compute_volatility(&history, is_crypto);

        let analysis = self.analyzer.analyze(
            current_price,
            market.strike,
            market.direction,
            volatility,
            candidate.hours_to_close(Utc::now()),
            is_crypto,
        );

        match analysis.recommendation {
            Recommendation::Reject => {
                return Ok(self.skip(market, SkipReason::VolatilityReject));
            }
            Recommendation::Risky if !self.config.allow_risky => {
                return Ok(self.skip(market, SkipReason::VolatilityRisky));
            }
            _ => {}
        }

        let entry_price = candidate.entry_price();
        if entry_price <= Decimal::ZERO || entry_price >= Decimal::ONE {
            return Err(PositionError::EntryPriceOutOfRange(entry_price).into());
        }

        let win_probability =
            crate::sizing::estimate_win_probability(entry_price, analysis.safety_margin);
        if win_probability < snapshot.min_probability {
            return Ok(self.skip(market, SkipReason::BelowProbabilityThreshold));
        }

        let calculator = SizeCalculator::new(SizingConfig {
            kelly_fraction: snapshot.kelly_fraction,
            min_position: self.config.min_position,
            max_bankroll_pct: self.config.max_bankroll_pct,
        });
        let sized = calculator.calculate(
            entry_price,
            win_probability,
            bankroll.current,
            analysis.safety_margin,
        );
        if let Some(reason) = sized.reason {
            let skip = match reason {
                SizeReason::NoEdge => SkipReason::SizingNoEdge,
                SizeReason::BelowMinimum => SkipReason::SizingBelowMinimum,
            };
            return Ok(self.skip(market, skip));
        }

        // The percentage cap keeps the size inside the bankroll; this
        // check only fires if the stored balance moved under us.
        if sized.size > bankroll.current {
            return Ok(self.skip(market, SkipReason::InsufficientFunds));
        }

        let position = Position {
            id: Uuid::new_v4(),
            platform_id: market.platform_id.clone(),
            market_id: market.market_id.clone(),
            title: market.title.clone(),
            asset: market.asset.clone(),
            strike: market.strike,
            direction: market.direction,
            entry_price,
            quantity: sized.size / entry_price,
            side: candidate.side,
            status: PositionStatus::Open,
            entry_safety_margin: analysis.safety_margin,
            entry_volatility: volatility,
            entry_time: Utc::now(),
        };

        // Debit first; undo it if the insert fails so no position can
        // exist that was never paid for.
        let balance = self
            .bankrolls
            .add_to_balance(&market.platform_id, -sized.size)
            .await?;
        if let Err(e) = self.positions.create(position.clone()).await {
            self.bankrolls
                .add_to_balance(&market.platform_id, sized.size)
                .await?;
            return Err(e);
        }

        telemetry::record_entry(&market.platform_id);
        telemetry::set_bankroll(&market.platform_id, balance);
        tracing::info!(
            position_id = %position.id,
            platform = %market.platform_id,
            market = %market.market_id,
            size = %sized.size,
            quantity = %position.quantity,
            entry_price = %entry_price,
            safety_margin = %analysis.safety_margin,
            win_probability = %win_probability,
            dry_run,
            "Entered position"
        );

        Ok(EntryOutcome::Entered(EntryDetails {
            position_id: position.id,
            size: sized.size,
            quantity: position.quantity,
            entry_price,
            safety_margin: analysis.safety_margin,
            volatility,
            win_probability,
        }))
    }

    /// Close an open position, crediting the raw proceeds back to the
    /// platform bankroll.
    pub async fn execute_exit(
        &self,
        position_id: Uuid,
        exit_price: Decimal,
        exit_reason: ExitReason,
        dry_run: bool,
    ) -> anyhow::Result<ExitOutcome> {
        let position = self
            .positions
            .get_by_id(position_id)
            .await?
            .ok_or(PositionError::NotFound(position_id))?;
        if !position.is_open() {
            return Err(PositionError::AlreadyClosed(position_id).into());
        }

        let closed = self
            .positions
            .close(position_id, exit_price, Utc::now(), exit_reason)
            .await?;
        let record = match &closed.status {
            PositionStatus::Closed(record) => record.clone(),
            PositionStatus::Open => unreachable!("close returned an open position"),
        };

        // Credit the raw proceeds, not entry + pnl, so the ledger stays
        // consistent with the debit taken at entry.
        let proceeds = exit_price * closed.quantity;
        let balance = self
            .bankrolls
            .add_to_balance(&closed.platform_id, proceeds)
            .await?;

        telemetry::record_exit(&closed.platform_id, exit_reason);
        telemetry::set_bankroll(&closed.platform_id, balance);
        tracing::info!(
            %position_id,
            platform = %closed.platform_id,
            market = %closed.market_id,
            %exit_price,
            ?exit_reason,
            realized_pnl = %record.realized_pnl,
            dry_run,
            "Closed position"
        );

        Ok(ExitOutcome {
            position_id,
            exit_price,
            exit_reason,
            realized_pnl: record.realized_pnl,
            entry_price: closed.entry_price,
            quantity: closed.quantity,
        })
    }

    fn skip(&self, market: &crate::market::Market, reason: SkipReason) -> EntryOutcome {
        telemetry::record_skip(&market.platform_id, reason);
        tracing::debug!(
            platform = %market.platform_id,
            market = %market.market_id,
            ?reason,
            "Skipped candidate"
        );
        EntryOutcome::Skipped(reason)
    }
}

//! Run command implementation
//!
//! Wires the stores, the simulated feed, the lifecycle manager and the
//! adaptive engine into three cooperative loops: a scan loop that gates
//! entries, a monitor loop that exits open positions, and a slow
//! adaptive loop that retunes parameters. Parameters are snapshotted
//! once per cycle so a mid-cycle adjustment never splits a decision.

use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::adaptive::{AdaptiveConfig, AdaptiveEngine};
use crate::config::Config;
use crate::market::sim::SimulatedFeed;
use crate::market::{Candidate, MarketDataSource, MarketFilter, TradingVenue};
use crate::model::VolatilityAnalyzer;
use crate::params::{default_parameters, ParamSnapshot};
use crate::position::{
    check_stop_loss, check_volatility_exit, ExitReason, LifecycleConfig, LifecycleManager,
    Position, Side,
};
use crate::storage::{BankrollStore, MemoryStore, ParameterStore, PositionStore};
use crate::telemetry;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Keep bookkeeping but never transmit orders to the venue
    #[arg(long)]
    pub dry_run: bool,

    /// Run one scan, monitor and adaptive pass, then exit
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let dry_run = self.dry_run || config.scan.dry_run;
        if dry_run {
            tracing::info!("Dry run: orders are never transmitted");
        }

        let store = MemoryStore::new();
        for platform in &config.platforms {
            store
                .initialize(&platform.id, platform.initial_bankroll)
                .await?;
            telemetry::set_bankroll(&platform.id, platform.initial_bankroll);
        }
        for parameter in default_parameters() {
            ParameterStore::save(&store, parameter).await?;
        }

        let mut feeds: Vec<Arc<SimulatedFeed>> = vec![];
        for platform in &config.platforms {
            feeds.push(Arc::new(SimulatedFeed::new(
                &platform.id,
                platform.initial_bankroll,
            )));
        }
        let market_data = feeds
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No platforms configured"))?;

        let manager = LifecycleManager::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            market_data.clone(),
            LifecycleConfig {
                allow_risky: config.lifecycle.allow_risky,
                history_hours: config.lifecycle.history_hours,
                min_position: config.sizing.min_position,
                max_bankroll_pct: config.sizing.max_bankroll_pct,
                session_assets: config.lifecycle.session_assets.clone(),
            },
        );

        let mut engine = AdaptiveEngine::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            AdaptiveConfig {
                lookback: config.adaptive.lookback,
                min_closed_trades: config.adaptive.min_closed_trades,
                platforms: config.platforms.iter().map(|p| p.id.clone()).collect(),
            },
        );

        let filter = MarketFilter {
            asset: config.scan.asset.clone(),
            max_hours_to_close: config.scan.max_hours_to_close,
        };
        let analyzer = VolatilityAnalyzer::new();

        let mut scan_timer =
            tokio::time::interval(std::time::Duration::from_secs(config.scan.interval_secs));
        let mut monitor_timer =
            tokio::time::interval(std::time::Duration::from_secs(config.monitor.interval_secs));
        let mut adaptive_timer =
            tokio::time::interval(std::time::Duration::from_secs(config.adaptive.interval_secs));

        if self.once {
            scan_cycle(&store, &manager, &feeds, &filter, dry_run).await?;
            monitor_cycle(&store, &manager, &feeds, &market_data, &analyzer, &config, dry_run)
                .await?;
            if config.adaptive.enabled {
                let action = engine.run_once().await?;
                tracing::info!(?action, "Adaptive pass complete");
            }
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = scan_timer.tick() => {
                    if let Err(e) = scan_cycle(&store, &manager, &feeds, &filter, dry_run).await {
                        tracing::warn!(error = %e, "Scan cycle failed");
                    }
                }
                _ = monitor_timer.tick() => {
                    if let Err(e) = monitor_cycle(
                        &store, &manager, &feeds, &market_data, &analyzer, &config, dry_run,
                    ).await {
                        tracing::warn!(error = %e, "Monitor cycle failed");
                    }
                }
                _ = adaptive_timer.tick() => {
                    if config.adaptive.enabled {
                        match engine.run_once().await {
                            Ok(action) => tracing::info!(?action, "Adaptive pass complete"),
                            Err(e) => tracing::warn!(error = %e, "Adaptive pass failed"),
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown requested");
                    return Ok(());
                }
            }
        }
    }
}

/// Pick the side discovery proposes: buy the market favorite
fn discovery_side(yes_price: Decimal) -> Side {
    if yes_price >= Decimal::new(5, 1) {
        Side::Yes
    } else {
        Side::No
    }
}

async fn scan_cycle(
    store: &MemoryStore,
    manager: &LifecycleManager,
    feeds: &[Arc<SimulatedFeed>],
    filter: &MarketFilter,
    dry_run: bool,
) -> anyhow::Result<()> {
    let snapshot = ParamSnapshot::from_parameters(&store.get_current().await?);

    for feed in feeds {
        let markets = feed.list_markets(filter).await?;
        tracing::debug!(count = markets.len(), "Scanned markets");
        for market in markets {
            let candidate = Candidate {
                side: discovery_side(market.yes_price),
                market,
            };
            let outcome = manager.process_entry(&candidate, &snapshot, dry_run).await?;
            tracing::debug!(?outcome, "Entry decision");
        }
    }

    telemetry::set_open_positions(store.get_open().await?.len());
    Ok(())
}

/// Mark price for a held side from the market's current quote
fn mark_price(position: &Position, yes_price: Decimal) -> Decimal {
    match position.side {
        Side::Yes => yes_price,
        Side::No => Decimal::ONE - yes_price,
    }
}

/// Settlement payout when a market has left the board
fn resolution_payout(position: &Position, spot: Decimal) -> Decimal {
    let condition_met = match position.direction {
        crate::position::Direction::Above => spot >= position.strike,
        crate::position::Direction::Below => spot <= position.strike,
    };
    let yes_pays = if condition_met {
        Decimal::ONE
    } else {
        Decimal::ZERO
    };
    mark_price(position, yes_pays)
}

async fn monitor_cycle(
    store: &MemoryStore,
    manager: &LifecycleManager,
    feeds: &[Arc<SimulatedFeed>],
    market_data: &Arc<SimulatedFeed>,
    analyzer: &VolatilityAnalyzer,
    config: &Config,
    dry_run: bool,
) -> anyhow::Result<()> {
    let snapshot = ParamSnapshot::from_parameters(&store.get_current().await?);
    let now = Utc::now();

    let mut quotes = vec![];
    for feed in feeds {
        quotes.extend(feed.list_markets(&MarketFilter::default()).await?);
    }

    for position in store.get_open().await? {
        let quote = quotes.iter().find(|m| m.market_id == position.market_id);
        match quote {
            Some(market) => {
                let mark = mark_price(&position, market.yes_price);

                if check_stop_loss(&position, mark, snapshot.stop_loss_pct) {
                    manager
                        .execute_exit(position.id, mark, ExitReason::StopLoss, dry_run)
                        .await?;
                    continue;
                }

                let hours_to_close =
                    (market.close_time - now).num_seconds().max(0) as f64 / 3600.0;
                let is_crypto = !config
                    .lifecycle
                    .session_assets
                    .iter()
                    .any(|a| a == &position.asset);
                let deteriorated = check_volatility_exit(
                    &position,
                    market_data.as_ref(),
                    analyzer,
                    hours_to_close,
                    snapshot.safety_margin_floor,
                    config.lifecycle.history_hours,
                    is_crypto,
                )
                .await?;
                if deteriorated {
                    manager
                        .execute_exit(position.id, mark, ExitReason::VolatilityExit, dry_run)
                        .await?;
                }
            }
            None => {
                // Market left the board: settle at the resolution payout
                let spot = market_data.get_price(&position.asset).await?;
                let payout = resolution_payout(&position, spot);
                manager
                    .execute_exit(position.id, payout, ExitReason::Resolution, dry_run)
                    .await?;
            }
        }
    }

    telemetry::set_open_positions(store.get_open().await?.len());
    Ok(())
}

//! Adaptive engine driver
//!
//! One pass per slow-cadence tick: drawdown circuit breaker first, then
//! guardrails, then segment analysis and a single bounded adjustment.
//! Each pass tunes one parameter dimension, round-robin, so coupled
//! thresholds never move together in one tick.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    analyze_by_segment, check_can_adjust, check_drawdown, suggest_adjustment, GuardrailBlock,
    OutcomeCollector,
};
use crate::params::{default_parameters, names};
use crate::storage::{BankrollStore, ParameterStore, PositionStore};
use crate::telemetry;

/// Adaptive engine configuration
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    /// How many recent closed trades feed each analysis
    pub lookback: usize,
    /// Below this many total closed trades the collector yields nothing
    pub min_closed_trades: usize,
    /// Platforms whose bankrolls feed the drawdown breaker
    pub platforms: Vec<String>,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            lookback: 100,
            min_closed_trades: 10,
            platforms: vec![],
        }
    }
}

/// What one engine pass did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdaptiveAction {
    /// Drawdown breach: all parameters reverted to defaults
    Reverted,
    /// A guardrail blocked the adjustment
    Blocked(GuardrailBlock),
    /// Not enough closed trades to analyze
    NoData,
    /// Analysis ran but suggested no change
    NoChange,
    /// A parameter was adjusted and the change recorded
    Adjusted {
        parameter: String,
        old_value: Decimal,
        new_value: Decimal,
    },
}

/// Periodically retunes parameters from closed-trade history
pub struct AdaptiveEngine {
    collector: OutcomeCollector,
    positions: Arc<dyn PositionStore>,
    parameters: Arc<dyn ParameterStore>,
    bankrolls: Arc<dyn BankrollStore>,
    config: AdaptiveConfig,
    /// Peak combined bankroll observed so far
    peak_bankroll: Decimal,
    /// Round-robin cursor over the tuned dimensions
    next_dimension: usize,
}

/// Parameter dimensions the engine tunes, in rotation order
const TUNED_DIMENSIONS: [&str; 2] = [names::MIN_PROBABILITY, names::SAFETY_MARGIN_FLOOR];

impl AdaptiveEngine {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        parameters: Arc<dyn ParameterStore>,
        bankrolls: Arc<dyn BankrollStore>,
        config: AdaptiveConfig,
    ) -> Self {
        Self {
            collector: OutcomeCollector::new(
                positions.clone(),
                config.lookback,
                config.min_closed_trades,
            ),
            positions,
            parameters,
            bankrolls,
            config,
            peak_bankroll: Decimal::ZERO,
            next_dimension: 0,
        }
    }

    /// Combined balance across the configured platforms
    async fn total_bankroll(&self) -> anyhow::Result<Decimal> {
        let mut total = Decimal::ZERO;
        for platform in &self.config.platforms {
            if let Some(bankroll) = self.bankrolls.get(platform).await? {
                total += bankroll.current;
            }
        }
        Ok(total)
    }

    /// Revert every tunable to its documented default, recording the
    /// reason in the history log.
    async fn revert_to_defaults(&self, reason: &str) -> anyhow::Result<()> {
        for default in default_parameters() {
            let current = self.parameters.get_by_name(&default.name).await?;
            match current {
                Some(p) if p.value == default.value => continue,
                Some(_) => {
                    self.parameters
                        .save_with_reason(&default.name, default.value, reason)
                        .await?;
                }
                None => self.parameters.save(default).await?,
            }
        }
        Ok(())
    }

    /// Run one adaptive pass.
    pub async fn run_once(&mut self) -> anyhow::Result<AdaptiveAction> {
        let total = self.total_bankroll().await?;
        if total > self.peak_bankroll {
            self.peak_bankroll = total;
        }

        if check_drawdown(total, self.peak_bankroll) {
            tracing::warn!(
                current = %total,
                peak = %self.peak_bankroll,
                "Drawdown breach, reverting parameters to defaults"
            );
            self.revert_to_defaults("drawdown breach, reverted to defaults")
                .await?;
            // Rearm the breaker from the post-revert balance
            self.peak_bankroll = total;
            return Ok(AdaptiveAction::Reverted);
        }

        let dimension = TUNED_DIMENSIONS[self.next_dimension % TUNED_DIMENSIONS.len()];
        self.next_dimension = (self.next_dimension + 1) % TUNED_DIMENSIONS.len();

        let total_closed = self.positions.count_closed().await?;
        let last_adjustment = self.parameters.last_adjustment_time(dimension).await?;
        if let Some(block) = check_can_adjust(total_closed, last_adjustment, Utc::now()) {
            tracing::debug!(parameter = dimension, ?block, "Adjustment blocked");
            return Ok(AdaptiveAction::Blocked(block));
        }

        let outcomes = self.collector.collect().await?;
        if outcomes.is_empty() {
            return Ok(AdaptiveAction::NoData);
        }

        let parameter = match self.parameters.get_by_name(dimension).await? {
            Some(p) => p,
            None => {
                // Bootstrap the missing parameter; adjust on a later pass
                let default = default_parameters()
                    .into_iter()
                    .find(|p| p.name == dimension)
                    .ok_or_else(|| anyhow::anyhow!("No default for parameter {dimension}"))?;
                self.parameters.save(default).await?;
                return Ok(AdaptiveAction::NoChange);
            }
        };

        let segments = analyze_by_segment(&outcomes, dimension);
        let suggested =
            suggest_adjustment(parameter.value, &segments, parameter.min, parameter.max);

        if suggested == parameter.value {
            return Ok(AdaptiveAction::NoChange);
        }

        let reason = format!(
            "segment analysis over {} trades moved {} from {} toward {}",
            outcomes.len(),
            dimension,
            parameter.value,
            suggested
        );
        self.parameters
            .save_with_reason(dimension, suggested, &reason)
            .await?;
        telemetry::record_adjustment(dimension);
        tracing::info!(
            parameter = dimension,
            old_value = %parameter.value,
            new_value = %suggested,
            "Adjusted parameter"
        );

        Ok(AdaptiveAction::Adjusted {
            parameter: dimension.to_string(),
            old_value: parameter.value,
            new_value: suggested,
        })
    }
}

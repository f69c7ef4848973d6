//! Tunable parameters
//!
//! Named, bounded scalars the adaptive engine is allowed to retune, plus
//! the immutable history entries that drive its cooldowns. Components
//! never read parameters mid-cycle: each cycle fetches one `ParamSnapshot`
//! up front so a half-updated set is never observable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Canonical parameter names
pub mod names {
    /// Minimum estimated win probability to enter
    pub const MIN_PROBABILITY: &str = "min_probability";
    /// Safety margin below which open positions are exited
    pub const SAFETY_MARGIN_FLOOR: &str = "safety_margin_floor";
    /// Stop-loss as a fraction of entry price
    pub const STOP_LOSS_PCT: &str = "stop_loss_pct";
    /// Kelly multiplier for sizing
    pub const KELLY_FRACTION: &str = "kelly_fraction";
}

/// One named, bounded, tunable scalar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Parameter {
    pub fn new(name: &str, value: Decimal, min: Decimal, max: Decimal) -> Self {
        Self {
            name: name.to_string(),
            value: value.clamp(min, max),
            min,
            max,
            updated_at: Utc::now(),
        }
    }

    /// New value clamped to this parameter's bounds
    pub fn clamp_to_bounds(&self, value: Decimal) -> Decimal {
        value.clamp(self.min, self.max)
    }
}

/// Immutable history entry recorded alongside every committed adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterChange {
    pub parameter: String,
    pub old_value: Decimal,
    pub new_value: Decimal,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Documented defaults, also the revert target on a drawdown breach
pub fn default_parameters() -> Vec<Parameter> {
    vec![
        Parameter::new(names::MIN_PROBABILITY, dec!(0.80), dec!(0.70), dec!(0.95)),
        Parameter::new(names::SAFETY_MARGIN_FLOOR, dec!(0.8), dec!(0.5), dec!(1.2)),
        Parameter::new(names::STOP_LOSS_PCT, dec!(0.20), dec!(0.05), dec!(0.50)),
        Parameter::new(names::KELLY_FRACTION, dec!(0.25), dec!(0.05), dec!(0.50)),
    ]
}

/// Read-once-per-cycle view of the tunable parameter set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSnapshot {
    pub min_probability: Decimal,
    pub safety_margin_floor: Decimal,
    pub stop_loss_pct: Decimal,
    pub kelly_fraction: Decimal,
    /// When this snapshot was taken
    pub fetched_at: DateTime<Utc>,
}

impl ParamSnapshot {
    /// Build a snapshot from stored parameters, falling back to the
    /// documented default for any missing name.
    pub fn from_parameters(parameters: &[Parameter]) -> Self {
        let lookup = |name: &str, default: Decimal| {
            parameters
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.value)
                .unwrap_or(default)
        };
        Self {
            min_probability: lookup(names::MIN_PROBABILITY, dec!(0.80)),
            safety_margin_floor: lookup(names::SAFETY_MARGIN_FLOOR, dec!(0.8)),
            stop_loss_pct: lookup(names::STOP_LOSS_PCT, dec!(0.20)),
            kelly_fraction: lookup(names::KELLY_FRACTION, dec!(0.25)),
            fetched_at: Utc::now(),
        }
    }
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self::from_parameters(&default_parameters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_new_clamps_value() {
        let param = Parameter::new("kelly_fraction", dec!(0.9), dec!(0.05), dec!(0.50));
        assert_eq!(param.value, dec!(0.50));
    }

    #[test]
    fn test_clamp_to_bounds() {
        let param = Parameter::new("stop_loss_pct", dec!(0.20), dec!(0.05), dec!(0.50));
        assert_eq!(param.clamp_to_bounds(dec!(0.01)), dec!(0.05));
        assert_eq!(param.clamp_to_bounds(dec!(0.60)), dec!(0.50));
        assert_eq!(param.clamp_to_bounds(dec!(0.25)), dec!(0.25));
    }

    #[test]
    fn test_default_snapshot() {
        let snapshot = ParamSnapshot::default();
        assert_eq!(snapshot.min_probability, dec!(0.80));
        assert_eq!(snapshot.safety_margin_floor, dec!(0.8));
        assert_eq!(snapshot.stop_loss_pct, dec!(0.20));
        assert_eq!(snapshot.kelly_fraction, dec!(0.25));
    }

    #[test]
    fn test_snapshot_reads_stored_values() {
        let params = vec![Parameter::new(
            names::KELLY_FRACTION,
            dec!(0.30),
            dec!(0.05),
            dec!(0.50),
        )];
        let snapshot = ParamSnapshot::from_parameters(&params);
        assert_eq!(snapshot.kelly_fraction, dec!(0.30));
        // Missing names fall back to defaults
        assert_eq!(snapshot.stop_loss_pct, dec!(0.20));
    }

    #[test]
    fn test_defaults_all_within_bounds() {
        for param in default_parameters() {
            assert!(param.value >= param.min && param.value <= param.max);
        }
    }
}

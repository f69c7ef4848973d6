//! Configuration types for strikegate

use rust_decimal::Decimal;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub platforms: Vec<PlatformConfig>,
    pub scan: ScanConfig,
    pub lifecycle: LifecycleSettings,
    pub monitor: MonitorConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub sizing: SizingSettings,
    #[serde(default)]
    pub adaptive: AdaptiveSettings,
}

/// A venue the engine trades on, with its paper bankroll
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub id: String,
    pub initial_bankroll: Decimal,
}

/// Market scan configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub interval_secs: u64,
    /// Restrict the scan to a single asset symbol
    pub asset: Option<String>,
    /// Only consider markets closing within this many hours
    pub max_hours_to_close: Option<f64>,
    /// Keep bookkeeping but never transmit orders to the venue
    #[serde(default)]
    pub dry_run: bool,
}

/// Entry gating configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleSettings {
    /// Accept risky volatility recommendations
    #[serde(default)]
    pub allow_risky: bool,

    /// Hours of price history fed into the volatility estimate
    #[serde(default = "default_history_hours")]
    pub history_hours: u32,

    /// Assets on a session-traded calendar (252 annualization periods)
    #[serde(default)]
    pub session_assets: Vec<String>,
}

fn default_history_hours() -> u32 {
    72
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            allow_risky: false,
            history_hours: 72,
            session_assets: vec![],
        }
    }
}

/// Open-position monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
}

/// Position sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SizingSettings {
    /// Minimum position in dollars
    #[serde(default = "default_min_position")]
    pub min_position: Decimal,

    /// Maximum bet as a fraction of bankroll
    #[serde(default = "default_max_bankroll_pct")]
    pub max_bankroll_pct: Decimal,
}

fn default_min_position() -> Decimal {
    Decimal::ONE
}
fn default_max_bankroll_pct() -> Decimal {
    Decimal::new(10, 2) // 0.10 = 10%
}

impl Default for SizingSettings {
    fn default() -> Self {
        Self {
            min_position: Decimal::ONE,
            max_bankroll_pct: Decimal::new(10, 2),
        }
    }
}

/// Adaptive engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdaptiveSettings {
    /// Enable parameter adjustment from trade history
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between adaptive passes
    #[serde(default = "default_adaptive_interval")]
    pub interval_secs: u64,

    /// Recent closed trades fed into each analysis
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Below this many closed trades the analysis is skipped
    #[serde(default = "default_min_closed_trades")]
    pub min_closed_trades: usize,
}

fn default_true() -> bool {
    true
}
fn default_adaptive_interval() -> u64 {
    3600
}
fn default_lookback() -> usize {
    100
}
fn default_min_closed_trades() -> usize {
    10
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            lookback: 100,
            min_closed_trades: 10,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port; omit to disable the exporter
    pub metrics_port: Option<u16>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

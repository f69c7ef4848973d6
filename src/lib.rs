//! strikegate: Risk-gated trading engine for binary-outcome prediction markets
//!
//! This library provides the core components for:
//! - Annualized volatility estimation from price history
//! - Safety-margin analysis of strike distance against expected move
//! - Fractional Kelly position sizing with probability boosting
//! - Gated position entry and the single-close lifecycle
//! - Stop-loss and volatility-deterioration exit monitoring
//! - Adaptive parameter tuning from segmented trade outcomes
//! - Full observability stack

pub mod adaptive;
pub mod cli;
pub mod config;
pub mod market;
pub mod model;
pub mod params;
pub mod position;
pub mod sizing;
pub mod storage;
pub mod telemetry;

//! Core domain types and logic: bars, indicators, signals, the backtest
//! state machine and the rollups built on them.

pub mod ohlcv;
pub mod series;
pub mod store;
pub mod indicator;
pub mod indicator_helpers;
pub mod signal;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod aggregate;
pub mod digest;
pub mod pipeline;
pub mod config_validation;
pub mod error;

//! signaldesk: technical indicators, crossover signals and threshold
//! backtests over daily price series.
//!
//! Hexagonal architecture: the pure engine in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`], and the command line
//! front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

//! Port traits at the I/O seams: configuration, price data, reports.

pub mod config_port;
pub mod data_port;
pub mod report_port;

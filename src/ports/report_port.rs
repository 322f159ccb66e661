//! Report output port.

use crate::domain::aggregate::AggregateRow;
use crate::domain::error::SignaldeskError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::position::Trade;
use crate::domain::signal::SignalRow;

/// Port for persisting the tabular outputs of a run.
pub trait ReportPort {
    fn write_indicators(
        &self,
        symbol: &str,
        rows: &[IndicatorRow],
        signals: &[SignalRow],
    ) -> Result<(), SignaldeskError>;

    fn write_trades(&self, symbol: &str, trades: &[Trade]) -> Result<(), SignaldeskError>;

    fn write_aggregate(&self, rows: &[AggregateRow]) -> Result<(), SignaldeskError>;
}

//! Price data access port.

use crate::domain::error::SignaldeskError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

/// Supplies raw bars. Range bounds are inclusive calendar dates; `None`
/// leaves that side open. Ordering and validation happen at ingestion.
pub trait DataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, SignaldeskError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignaldeskError>;
}

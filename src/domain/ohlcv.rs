//! OHLCV bar representation.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a bar was rejected at the ingestion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// A price or volume field is NaN or infinite (missing in the source).
    NonFinite,
    /// `high` is below one of open/close/low, or `low` above one of them.
    HighLowViolation,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::NonFinite => write!(f, "non-numeric field"),
            MalformedReason::HighLowViolation => write!(f, "high/low range violated"),
        }
    }
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn check(&self) -> Result<(), MalformedReason> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(MalformedReason::NonFinite);
        }
        if self.high < self.open.max(self.close).max(self.low)
            || self.low > self.open.min(self.close).min(self.high)
        {
            return Err(MalformedReason::HighLowViolation);
        }
        Ok(())
    }
}

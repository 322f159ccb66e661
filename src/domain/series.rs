//! Per-instrument bar series and the ingestion boundary.
//!
//! A `Series` is always strictly ascending by timestamp and contains only
//! well-formed bars. Malformed bars are dropped here and reported in an
//! `IngestReport`; ordering problems are structural and rejected outright.

use crate::domain::error::SignaldeskError;
use crate::domain::ohlcv::{Bar, MalformedReason};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedBar {
    pub timestamp: NaiveDateTime,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub dropped: Vec<DroppedBar>,
}

impl IngestReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

impl Series {
    /// Validate raw bars into a series.
    ///
    /// Malformed bars are skipped before the ordering check, so a malformed
    /// bar never causes an ordering error on its own.
    pub fn ingest(
        symbol: impl Into<String>,
        raw: Vec<Bar>,
    ) -> Result<(Series, IngestReport), SignaldeskError> {
        let symbol = symbol.into();
        let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());
        let mut report = IngestReport::default();

        for bar in raw {
            if let Err(reason) = bar.check() {
                report.dropped.push(DroppedBar {
                    timestamp: bar.timestamp,
                    reason,
                });
                continue;
            }
            if let Some(prev) = bars.last() {
                if bar.timestamp == prev.timestamp {
                    return Err(SignaldeskError::DuplicateTimestamp {
                        symbol,
                        timestamp: bar.timestamp,
                    });
                }
                if bar.timestamp < prev.timestamp {
                    return Err(SignaldeskError::UnorderedSeries {
                        symbol,
                        index: bars.len(),
                    });
                }
            }
            bars.push(bar);
        }

        report.accepted = bars.len();
        Ok((Series { symbol, bars }, report))
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Series {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: ts(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn ingest_keeps_valid_bars_in_order() {
        let (series, report) =
            Series::ingest("AAPL", vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]).unwrap();
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.len(), 3);
        assert_eq!(report.accepted, 3);
        assert_eq!(report.dropped_count(), 0);
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn ingest_drops_malformed_and_counts_them() {
        let broken = Bar {
            high: 5.0,
            ..bar(2, 11.0)
        };
        let missing = Bar {
            close: f64::NAN,
            ..bar(3, 12.0)
        };
        let (series, report) =
            Series::ingest("TSLA", vec![bar(1, 10.0), broken, missing, bar(4, 13.0)]).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.dropped_count(), 2);
        assert_eq!(report.dropped[0].reason, MalformedReason::HighLowViolation);
        assert_eq!(report.dropped[1].reason, MalformedReason::NonFinite);
        assert_eq!(report.dropped[1].timestamp, ts(3));
    }

    #[test]
    fn ingest_rejects_duplicate_timestamp() {
        let err = Series::ingest("KO", vec![bar(1, 10.0), bar(1, 10.5)]).unwrap_err();
        assert!(matches!(err, SignaldeskError::DuplicateTimestamp { .. }));
    }

    #[test]
    fn ingest_rejects_descending_timestamps() {
        let err = Series::ingest("PG", vec![bar(2, 10.0), bar(1, 10.5)]).unwrap_err();
        assert!(matches!(
            err,
            SignaldeskError::UnorderedSeries { index: 1, .. }
        ));
    }

    #[test]
    fn ingest_empty_is_not_an_error() {
        let (series, report) = Series::ingest("NFLX", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(report.accepted, 0);
    }
}

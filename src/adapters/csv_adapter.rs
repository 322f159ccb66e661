//! CSV file price adapter.
//!
//! One file per instrument, `<dir>/<SYMBOL>.csv`, with a header row naming
//! at least `date,open,high,low,close` (case-insensitive, any order; extra
//! columns such as `adj close` are ignored, a missing `volume` reads as 0).

use crate::domain::error::SignaldeskError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, SignaldeskError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| SignaldeskError::Data {
                reason: format!("{}: missing {} column", path, name),
            })
        };
        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Unparseable or empty numbers become NaN so ingestion drops the bar.
fn parse_number(record: &csv::StringRecord, index: usize) -> f64 {
    record
        .get(index)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, SignaldeskError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(SignaldeskError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let shown = path.display().to_string();

        let mut rdr = csv::Reader::from_path(&path)?;
        let columns = Columns::from_headers(rdr.headers()?, &shown)?;
        let mut bars = Vec::new();
        let mut unparsed = 0usize;

        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            let raw_date = record.get(columns.date).unwrap_or("");
            let timestamp = parse_timestamp(raw_date).ok_or_else(|| SignaldeskError::Data {
                reason: format!("{} row {}: invalid date {:?}", shown, line + 1, raw_date),
            })?;

            let date = timestamp.date();
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }

            let bar = Bar {
                timestamp,
                open: parse_number(&record, columns.open),
                high: parse_number(&record, columns.high),
                low: parse_number(&record, columns.low),
                close: parse_number(&record, columns.close),
                volume: columns.volume.map_or(0.0, |i| parse_number(&record, i)),
            };
            if bar.check().is_err() {
                unparsed += 1;
            }
            bars.push(bar);
        }

        if unparsed > 0 {
            warn!(symbol, rows = unparsed, "rows with missing or invalid prices");
        }
        debug!(symbol, bars = bars.len(), path = %shown, "loaded csv");

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignaldeskError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SignaldeskError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "csv") {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not a price file").unwrap();

        (dir, path)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_bars_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BHP", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, day(15).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000.0);
        assert_eq!(bars[2].close, 115.0);
    }

    #[test]
    fn fetch_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_bars("BHP", Some(day(16)), Some(day(16)))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 110.0);

        let bars = adapter.fetch_bars("BHP", Some(day(16)), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_bars_missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_bars("XYZ", None, None).unwrap_err();
        assert!(matches!(err, SignaldeskError::NoData { symbol } if symbol == "XYZ"));
    }

    #[test]
    fn bad_numbers_become_nan() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("KO.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-02-01,60,61,59,60.5,60.1,1000\n\
             2024-02-02,60,,59,60.5,60.1,1000\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_bars("KO", None, None).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].check().is_ok());
        assert!(bars[1].high.is_nan());
    }

    #[test]
    fn invalid_date_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("KO.csv"),
            "date,open,high,low,close,volume\nyesterday,1,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("KO", None, None).unwrap_err();
        assert!(matches!(err, SignaldeskError::Data { .. }));
    }

    #[test]
    fn missing_column_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("KO.csv"), "date,open,high,low\n2024-01-01,1,1,1\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("KO", None, None).unwrap_err();
        assert!(matches!(err, SignaldeskError::Data { reason } if reason.contains("close")));
    }

    #[test]
    fn intraday_timestamps_parse() {
        let ts = parse_timestamp("2024-03-01 09:30:00").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(parse_timestamp("2024-03-01T09:30:00").is_some());
        assert!(parse_timestamp("03/01/2024").is_none());
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }

    #[test]
    fn list_symbols_missing_dir() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/prices"));
        assert!(adapter.list_symbols().is_err());
    }
}

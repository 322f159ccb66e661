#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signaldesk::domain::error::SignaldeskError;
pub use signaldesk::domain::ohlcv::Bar;
use signaldesk::domain::series::Series;
use signaldesk::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, SignaldeskError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignaldeskError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .ok_or_else(|| SignaldeskError::NoData {
                symbol: symbol.to_string(),
            })?;
        Ok(bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.timestamp.date() >= s))
            .filter(|b| end.is_none_or(|e| b.timestamp.date() <= e))
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignaldeskError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(i as i64)
}

/// Flat bars: open = high = low = close.
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: day(i),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Bars with a one-unit range around the close.
pub fn make_ranged_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: day(i),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn make_series(symbol: &str, closes: &[f64]) -> Series {
    Series::ingest(symbol, make_bars(closes)).unwrap().0
}

pub fn sine_closes(n: usize, amplitude: f64, period: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect()
}

pub fn write_price_csv(dir: &Path, symbol: &str, bars: &[Bar]) {
    let mut file = std::fs::File::create(dir.join(format!("{}.csv", symbol))).unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
}

/// Exit codes only implement Debug; compare through it.
pub fn exit_code_str(code: std::process::ExitCode) -> String {
    format!("{:?}", code)
}

pub fn expected_code(code: u8) -> String {
    format!("{:?}", std::process::ExitCode::from(code))
}

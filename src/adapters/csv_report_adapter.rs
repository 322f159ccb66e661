//! CSV report adapter.
//!
//! Writes `<SYMBOL>_indicators.csv`, `<SYMBOL>_trades.csv` and
//! `aggregate.csv` under one output directory. Undefined values are empty
//! cells.

use crate::domain::aggregate::AggregateRow;
use crate::domain::error::SignaldeskError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::position::Trade;
use crate::domain::signal::SignalRow;
use crate::ports::report_port::ReportPort;
use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct IndicatorRecord {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    ema_fast: Option<f64>,
    ema_slow: Option<f64>,
    sma_fast: Option<f64>,
    sma_slow: Option<f64>,
    rsi: Option<f64>,
    atr: Option<f64>,
    bb_mid: Option<f64>,
    bb_upper: Option<f64>,
    bb_lower: Option<f64>,
    bb_pct_b: Option<f64>,
    signal: String,
    cross: String,
    tags: String,
}

#[derive(Serialize)]
struct TradeRecord {
    side: String,
    entry_date: String,
    entry_price: f64,
    exit_date: String,
    exit_price: f64,
    return_pct: f64,
    exit_reason: String,
}

#[derive(Serialize)]
struct AggregateRecord<'a> {
    symbol: &'a str,
    bars: usize,
    mean_atr: Option<f64>,
    mean_rsi: Option<f64>,
    golden_crosses: usize,
    death_crosses: usize,
    overbought_days: usize,
    oversold_days: usize,
    lower_band_touches: usize,
    upper_band_breaks: usize,
    trade_count: Option<usize>,
    total_return: Option<f64>,
}

/// Date only for daily bars, full timestamp otherwise.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_records<T: Serialize>(
        &self,
        file_name: &str,
        records: impl IntoIterator<Item = T>,
    ) -> Result<(), SignaldeskError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| SignaldeskError::Report {
            reason: format!("cannot create {}: {}", self.output_dir.display(), e),
        })?;
        let path = self.output_dir.join(file_name);
        let mut wtr = csv::Writer::from_path(&path)?;
        let mut count = 0usize;
        for record in records {
            wtr.serialize(record)?;
            count += 1;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = count, "report written");
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_indicators(
        &self,
        symbol: &str,
        rows: &[IndicatorRow],
        signals: &[SignalRow],
    ) -> Result<(), SignaldeskError> {
        if rows.len() != signals.len() {
            return Err(SignaldeskError::Report {
                reason: format!(
                    "{}: {} rows but {} signals",
                    symbol,
                    rows.len(),
                    signals.len()
                ),
            });
        }
        let records = rows.iter().zip(signals).map(|(row, sig)| IndicatorRecord {
            date: format_timestamp(&row.bar.timestamp),
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            volume: row.bar.volume,
            ema_fast: row.ema_fast,
            ema_slow: row.ema_slow,
            sma_fast: row.sma_fast,
            sma_slow: row.sma_slow,
            rsi: row.rsi,
            atr: row.atr,
            bb_mid: row.bb_mid,
            bb_upper: row.bb_upper,
            bb_lower: row.bb_lower,
            bb_pct_b: row.bb_pct_b,
            signal: sig.signal.to_string(),
            cross: sig.cross.map(|c| c.to_string()).unwrap_or_default(),
            tags: sig
                .tags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        });
        self.write_records(&format!("{}_indicators.csv", symbol), records)
    }

    fn write_trades(&self, symbol: &str, trades: &[Trade]) -> Result<(), SignaldeskError> {
        let records = trades.iter().map(|t| TradeRecord {
            side: t.side.to_string(),
            entry_date: format_timestamp(&t.entry_ts),
            entry_price: t.entry_price,
            exit_date: format_timestamp(&t.exit_ts),
            exit_price: t.exit_price,
            return_pct: t.return_pct,
            exit_reason: t.exit_reason.to_string(),
        });
        self.write_records(&format!("{}_trades.csv", symbol), records)
    }

    fn write_aggregate(&self, rows: &[AggregateRow]) -> Result<(), SignaldeskError> {
        let records = rows.iter().map(|r| AggregateRecord {
            symbol: &r.symbol,
            bars: r.bars,
            mean_atr: r.mean_atr,
            mean_rsi: r.mean_rsi,
            golden_crosses: r.golden_crosses,
            death_crosses: r.death_crosses,
            overbought_days: r.overbought_days,
            oversold_days: r.oversold_days,
            lower_band_touches: r.lower_band_touches,
            upper_band_breaks: r.upper_band_breaks,
            trade_count: r.trade_count,
            total_return: r.total_return,
        });
        self.write_records("aggregate.csv", records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::closes_to_bars;
    use crate::domain::position::{ExitReason, Side};
    use crate::domain::signal::{CrossEvent, ExtremeTag, Signal};
    use tempfile::TempDir;

    fn row(close: f64, rsi: Option<f64>) -> IndicatorRow {
        IndicatorRow {
            bar: closes_to_bars(&[close]).remove(0),
            ema_fast: Some(close),
            ema_slow: Some(close),
            sma_fast: None,
            sma_slow: None,
            rsi,
            atr: None,
            bb_mid: None,
            bb_upper: None,
            bb_lower: None,
            bb_pct_b: None,
        }
    }

    #[test]
    fn writes_indicator_csv_with_empty_cells() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().join("out"));
        let rows = vec![row(100.0, None)];
        let signals = vec![SignalRow {
            signal: Signal::Long,
            cross: Some(CrossEvent::GoldenCross),
            tags: vec![ExtremeTag::TouchingLowerBand, ExtremeTag::Oversold],
        }];
        adapter.write_indicators("AAPL", &rows, &signals).unwrap();

        let text = fs::read_to_string(dir.path().join("out/AAPL_indicators.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,open,high,low,close,volume,ema_fast,ema_slow,sma_fast,sma_slow,rsi,atr,bb_mid,bb_upper,bb_lower,bb_pct_b,signal,cross,tags"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-01-01,100.0,100.0,100.0,100.0,1000.0,100.0,100.0,,,,,,,,,LONG,golden cross,touching lower Bollinger band;RSI oversold"
        );
    }

    #[test]
    fn mismatched_rows_rejected() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let err = adapter
            .write_indicators("AAPL", &[row(1.0, None)], &[])
            .unwrap_err();
        assert!(matches!(err, SignaldeskError::Report { .. }));
    }

    #[test]
    fn writes_trades_csv() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let bars = closes_to_bars(&[100.0, 100.5]);
        let trades = vec![Trade {
            entry_price: 100.0,
            exit_price: 100.5,
            side: Side::Long,
            entry_ts: bars[0].timestamp,
            exit_ts: bars[1].timestamp,
            return_pct: 0.005,
            exit_reason: ExitReason::TakeProfit,
        }];
        adapter.write_trades("MSFT", &trades).unwrap();

        let text = fs::read_to_string(dir.path().join("MSFT_trades.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "side,entry_date,entry_price,exit_date,exit_price,return_pct,exit_reason"
        );
        assert_eq!(
            lines[1],
            "LONG,2024-01-01,100.0,2024-01-02,100.5,0.005,take_profit"
        );
    }

    #[test]
    fn writes_aggregate_csv() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvReportAdapter::new(dir.path().to_path_buf());
        let rows = vec![AggregateRow {
            symbol: "KO".into(),
            bars: 30,
            mean_atr: Some(1.5),
            mean_rsi: None,
            golden_crosses: 2,
            death_crosses: 1,
            overbought_days: 3,
            oversold_days: 0,
            lower_band_touches: 1,
            upper_band_breaks: 4,
            trade_count: Some(5),
            total_return: Some(0.01),
        }];
        adapter.write_aggregate(&rows).unwrap();

        let text = fs::read_to_string(dir.path().join("aggregate.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "KO,30,1.5,,2,1,3,0,1,4,5,0.01");
    }

    #[test]
    fn intraday_timestamp_format() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-06 14:30:00");
    }
}

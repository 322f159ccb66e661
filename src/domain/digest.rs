//! Structured notification payload.
//!
//! The daily summary an external notifier turns into a message: the latest
//! signal per instrument, the most recent notable rows, and the backtest
//! outcome. Nothing here formats text for delivery.

use crate::domain::indicator::IndicatorRow;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::pipeline::{AnalysisMap, InstrumentAnalysis};
use crate::domain::position::Trade;
use crate::domain::signal::{CrossEvent, ExtremeTag, Signal, SignalRow};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSnapshot {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub rsi: Option<f64>,
    pub signal: Signal,
    pub cross: Option<CrossEvent>,
    pub tags: Vec<ExtremeTag>,
}

impl SignalSnapshot {
    fn from_row(row: &IndicatorRow, signal: &SignalRow) -> Self {
        SignalSnapshot {
            timestamp: row.bar.timestamp,
            close: row.close(),
            rsi: row.rsi,
            signal: signal.signal,
            cross: signal.cross,
            tags: signal.tags.clone(),
        }
    }
}

pub fn latest_snapshot(rows: &[IndicatorRow], signals: &[SignalRow]) -> Option<SignalSnapshot> {
    let row = rows.last()?;
    let signal = signals.get(rows.len() - 1)?;
    Some(SignalSnapshot::from_row(row, signal))
}

/// The `n` most recent rows carrying a cross or an extreme tag, newest first.
pub fn recent_events(rows: &[IndicatorRow], signals: &[SignalRow], n: usize) -> Vec<SignalSnapshot> {
    rows.iter()
        .zip(signals)
        .rev()
        .filter(|(_, s)| s.is_event())
        .take(n)
        .map(|(row, s)| SignalSnapshot::from_row(row, s))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentDigest {
    pub summary: PerformanceSummary,
    pub trades: Vec<Trade>,
    pub latest: Option<SignalSnapshot>,
    pub recent: Vec<SignalSnapshot>,
}

impl InstrumentDigest {
    pub fn from_analysis(analysis: &InstrumentAnalysis, recent: usize) -> Self {
        let rows = &analysis.enriched.rows;
        InstrumentDigest {
            summary: analysis.backtest.summary.clone(),
            trades: analysis.backtest.trades.clone(),
            latest: latest_snapshot(rows, &analysis.signals),
            recent: recent_events(rows, &analysis.signals, recent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Digest {
    pub instruments: BTreeMap<String, InstrumentDigest>,
}

impl Digest {
    /// Failed instruments are skipped.
    pub fn build(results: &AnalysisMap, recent: usize) -> Self {
        let instruments = results
            .iter()
            .filter_map(|(symbol, r)| {
                let analysis = r.as_ref().ok()?;
                Some((symbol.clone(), InstrumentDigest::from_analysis(analysis, recent)))
            })
            .collect();
        Digest { instruments }
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::closes_to_bars;

    fn rows(n: usize) -> Vec<IndicatorRow> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        closes_to_bars(&closes)
            .into_iter()
            .map(|bar| IndicatorRow {
                bar,
                ema_fast: None,
                ema_slow: None,
                sma_fast: None,
                sma_slow: None,
                rsi: None,
                atr: None,
                bb_mid: None,
                bb_upper: None,
                bb_lower: None,
                bb_pct_b: None,
            })
            .collect()
    }

    fn plain(signal: Signal) -> SignalRow {
        SignalRow {
            signal,
            cross: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn latest_snapshot_uses_last_row() {
        let r = rows(3);
        let s = vec![plain(Signal::Flat), plain(Signal::Flat), plain(Signal::Short)];
        let snap = latest_snapshot(&r, &s).unwrap();
        assert_eq!(snap.close, 102.0);
        assert_eq!(snap.signal, Signal::Short);
        assert_eq!(snap.timestamp, r[2].bar.timestamp);
    }

    #[test]
    fn latest_snapshot_empty() {
        assert!(latest_snapshot(&[], &[]).is_none());
    }

    #[test]
    fn recent_events_newest_first() {
        let r = rows(5);
        let mut s: Vec<SignalRow> = (0..5).map(|_| plain(Signal::Long)).collect();
        s[1].cross = Some(CrossEvent::GoldenCross);
        s[2].tags = vec![ExtremeTag::Overbought];
        s[4].tags = vec![ExtremeTag::BreakingUpperBand];

        let events = recent_events(&r, &s, 2);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].close, 104.0);
        assert_eq!(events[1].close, 102.0);

        let all = recent_events(&r, &s, 10);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].cross, Some(CrossEvent::GoldenCross));
    }

    #[test]
    fn recent_events_zero_requested() {
        let r = rows(2);
        let mut s = vec![plain(Signal::Flat), plain(Signal::Flat)];
        s[1].tags = vec![ExtremeTag::Oversold];
        assert!(recent_events(&r, &s, 0).is_empty());
    }

    #[test]
    fn digest_skips_failed_instruments() {
        use crate::domain::error::SignaldeskError;
        use crate::domain::pipeline::{EngineConfig, analyze_instrument};
        use crate::domain::series::Series;

        let series = Series::ingest("AAPL", closes_to_bars(&[100.0, 101.0, 99.0])).unwrap().0;
        let analysis = analyze_instrument(&series, &EngineConfig::default()).unwrap();
        let mut results: AnalysisMap = BTreeMap::new();
        results.insert("AAPL".into(), Ok(analysis));
        results.insert(
            "BAD".into(),
            Err(SignaldeskError::NoData {
                symbol: "BAD".into(),
            }),
        );

        let digest = Digest::build(&results, 5);
        assert_eq!(digest.instruments.len(), 1);
        let aapl = &digest.instruments["AAPL"];
        assert_eq!(aapl.latest.as_ref().unwrap().close, 99.0);
        assert_eq!(aapl.summary.trade_count, aapl.trades.len());
    }
}

//! Per-instrument analysis pipeline.
//!
//! indicators -> signals -> backtest for one `Series`, and the same over a
//! whole `SeriesStore` with one rayon task per instrument. Each task reads
//! only its own series and writes only its own key, so a failing instrument
//! never touches the others.

use crate::domain::aggregate::{AggregateInput, AggregateRow, aggregate};
use crate::domain::backtest::{BacktestConfig, BacktestResult, run_backtest};
use crate::domain::error::SignaldeskError;
use crate::domain::indicator::{self, EnrichedSeries, IndicatorParams};
use crate::domain::series::Series;
use crate::domain::signal::{self, SignalParams, SignalRow};
use crate::domain::store::SeriesStore;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub indicators: IndicatorParams,
    pub signals: SignalParams,
    pub backtest: BacktestConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SignaldeskError> {
        self.indicators.validate()?;
        self.signals.validate()?;
        self.backtest.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentAnalysis {
    pub enriched: EnrichedSeries,
    pub signals: Vec<SignalRow>,
    pub backtest: BacktestResult,
}

impl InstrumentAnalysis {
    pub fn symbol(&self) -> &str {
        &self.enriched.symbol
    }

    pub fn aggregate_input(&self) -> AggregateInput<'_> {
        AggregateInput {
            symbol: &self.enriched.symbol,
            rows: &self.enriched.rows,
            signals: &self.signals,
            backtest: Some(&self.backtest),
        }
    }
}

pub type AnalysisMap = BTreeMap<String, Result<InstrumentAnalysis, SignaldeskError>>;

/// What happened while filling a `SeriesStore` from a `DataPort`.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<(String, SignaldeskError)>,
    pub dropped_bars: usize,
}

/// Fetch and ingest each symbol. A symbol that cannot be fetched or ingested
/// is skipped and recorded; the others still load.
pub fn load_store(
    data: &dyn DataPort,
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (SeriesStore, LoadReport) {
    let mut store = SeriesStore::new();
    let mut report = LoadReport::default();

    for symbol in symbols {
        let loaded = data
            .fetch_bars(symbol, start, end)
            .and_then(|bars| Series::ingest(symbol.as_str(), bars));
        match loaded {
            Ok((series, ingest)) => {
                if ingest.dropped_count() > 0 {
                    warn!(
                        symbol = %symbol,
                        dropped = ingest.dropped_count(),
                        accepted = ingest.accepted,
                        "dropped malformed bars"
                    );
                }
                debug!(symbol = %symbol, bars = series.len(), "series loaded");
                report.dropped_bars += ingest.dropped_count();
                report.loaded.push(symbol.clone());
                store.insert(series);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping instrument");
                report.skipped.push((symbol.clone(), e));
            }
        }
    }

    (store, report)
}

pub fn analyze_instrument(
    series: &Series,
    config: &EngineConfig,
) -> Result<InstrumentAnalysis, SignaldeskError> {
    let enriched = indicator::compute(series, &config.indicators)?;
    let signals = signal::detect(&enriched.rows, &config.signals);
    let backtest = run_backtest(&enriched.rows, &signals, &config.backtest)?;
    debug!(
        symbol = %series.symbol(),
        bars = enriched.len(),
        trades = backtest.summary.trade_count,
        "instrument analysed"
    );
    Ok(InstrumentAnalysis {
        enriched,
        signals,
        backtest,
    })
}

fn log_outcome(results: &AnalysisMap) {
    let failed = results.values().filter(|r| r.is_err()).count();
    for (symbol, result) in results {
        if let Err(e) = result {
            warn!(symbol = %symbol, error = %e, "instrument analysis failed");
        }
    }
    info!(instruments = results.len(), failed, "analysis complete");
}

/// Analyse every instrument in parallel. Configuration is validated once up
/// front; per-instrument failures land in that instrument's slot.
pub fn analyze_store(
    store: &SeriesStore,
    config: &EngineConfig,
) -> Result<AnalysisMap, SignaldeskError> {
    config.validate()?;
    let series: Vec<&Series> = store.iter().map(|(_, s)| s).collect();
    let results: AnalysisMap = series
        .par_iter()
        .map(|s| (s.symbol().to_string(), analyze_instrument(s, config)))
        .collect();
    log_outcome(&results);
    Ok(results)
}

/// Same output as [`analyze_store`], on the calling thread.
pub fn analyze_store_sequential(
    store: &SeriesStore,
    config: &EngineConfig,
) -> Result<AnalysisMap, SignaldeskError> {
    config.validate()?;
    let results: AnalysisMap = store
        .iter()
        .map(|(symbol, s)| (symbol.clone(), analyze_instrument(s, config)))
        .collect();
    log_outcome(&results);
    Ok(results)
}

/// Aggregate table over the successful analyses.
pub fn aggregate_results(results: &AnalysisMap) -> Vec<AggregateRow> {
    aggregate(
        results
            .values()
            .filter_map(|r| r.as_ref().ok())
            .map(InstrumentAnalysis::aggregate_input),
    )
}

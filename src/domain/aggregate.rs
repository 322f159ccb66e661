//! Cross-instrument rollup.
//!
//! One `AggregateRow` per instrument with data, built from rows and signals
//! that were already computed. Means cover defined rows only.

use crate::domain::backtest::BacktestResult;
use crate::domain::indicator::IndicatorRow;
use crate::domain::indicator_helpers::mean;
use crate::domain::signal::{CrossEvent, ExtremeTag, SignalRow, count_cross, count_tag};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub symbol: String,
    pub bars: usize,
    pub mean_atr: Option<f64>,
    pub mean_rsi: Option<f64>,
    pub golden_crosses: usize,
    pub death_crosses: usize,
    pub overbought_days: usize,
    pub oversold_days: usize,
    pub lower_band_touches: usize,
    pub upper_band_breaks: usize,
    pub trade_count: Option<usize>,
    pub total_return: Option<f64>,
}

/// What the rollup needs from one analysed instrument.
pub struct AggregateInput<'a> {
    pub symbol: &'a str,
    pub rows: &'a [IndicatorRow],
    pub signals: &'a [SignalRow],
    pub backtest: Option<&'a BacktestResult>,
}

fn defined_mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    mean(&defined)
}

pub fn aggregate_row(input: &AggregateInput<'_>) -> Option<AggregateRow> {
    if input.rows.is_empty() {
        return None;
    }
    Some(AggregateRow {
        symbol: input.symbol.to_string(),
        bars: input.rows.len(),
        mean_atr: defined_mean(input.rows.iter().map(|r| r.atr)),
        mean_rsi: defined_mean(input.rows.iter().map(|r| r.rsi)),
        golden_crosses: count_cross(input.signals, CrossEvent::GoldenCross),
        death_crosses: count_cross(input.signals, CrossEvent::DeathCross),
        overbought_days: count_tag(input.signals, ExtremeTag::Overbought),
        oversold_days: count_tag(input.signals, ExtremeTag::Oversold),
        lower_band_touches: count_tag(input.signals, ExtremeTag::TouchingLowerBand),
        upper_band_breaks: count_tag(input.signals, ExtremeTag::BreakingUpperBand),
        trade_count: input.backtest.map(|b| b.summary.trade_count),
        total_return: input.backtest.map(|b| b.summary.total_return),
    })
}

/// Rows come back sorted by symbol; instruments without data are left out.
pub fn aggregate<'a>(inputs: impl IntoIterator<Item = AggregateInput<'a>>) -> Vec<AggregateRow> {
    let mut rows: Vec<AggregateRow> = inputs
        .into_iter()
        .filter_map(|input| aggregate_row(&input))
        .collect();
    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    rows
}

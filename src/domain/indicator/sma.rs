//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::mean;
use crate::domain::ohlcv::Bar;

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(IndicatorType::Sma(period), bars.len());
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = (0..closes.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                mean(&closes[i + 1 - period..=i])
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

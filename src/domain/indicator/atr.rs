//! Average True Range.
//!
//! TR[0] = H[0] - L[0]; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR is TR smoothed with alpha = 1/n; the first n-1 bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::ExpSmoother;
use crate::domain::ohlcv::Bar;

pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(IndicatorType::Atr(period), bars.len());
    }

    let mut smoother = ExpSmoother::wilder(period);
    let values = true_ranges(bars)
        .into_iter()
        .map(|tr| smoother.update(tr))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

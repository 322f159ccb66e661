//! Rolling sample standard deviation of closes.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) bars are undefined; n < 2 is undefined everywhere.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::sample_stddev;
use crate::domain::ohlcv::Bar;

pub fn calculate_stddev(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period < 2 {
        return IndicatorSeries::undefined(IndicatorType::Stddev(period), bars.len());
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = (0..closes.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                sample_stddev(&closes[i + 1 - period..=i])
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values,
    }
}

//! Exponential Moving Average.
//!
//! k = 2/(span+1), seeded with the first close, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! No warm-up gap: every bar gets a value.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::ExpSmoother;
use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries::undefined(IndicatorType::Ema(span), bars.len());
    }

    let mut smoother = ExpSmoother::span(span);
    let values = bars.iter().map(|bar| smoother.update(bar.close)).collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}

//! Bollinger Bands.
//!
//! - Middle: simple moving average of close over n bars
//! - Upper: middle + mult × stddev
//! - Lower: middle - mult × stddev
//!
//! stddev is the sample standard deviation (divides by N-1).
//! Warmup: first (n-1) bars are undefined.
//!
//! %B places the close inside the band, clamped to [0, 1]: 0 at or below the
//! lower band, 1 at or above the upper band.

use crate::domain::indicator::stddev::calculate_stddev;
use crate::domain::indicator::{Bands, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{DIVISION_EPSILON, mean};
use crate::domain::ohlcv::Bar;

pub fn calculate_bollinger(bars: &[Bar], period: usize, mult: f64) -> IndicatorSeries<Bands> {
    let indicator_type = IndicatorType::Bollinger { period, mult };
    let stddev = calculate_stddev(bars, period);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let values = stddev
        .values
        .iter()
        .enumerate()
        .map(|(i, sd)| {
            let sd = (*sd)?;
            let middle = mean(&closes[i + 1 - period..=i])?;
            Some(Bands {
                upper: middle + mult * sd,
                middle,
                lower: middle - mult * sd,
            })
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// %B = (close - lower) / (upper - lower) in [0, 1], zero width replaced by
/// epsilon.
pub fn percent_b(close: f64, bands: &Bands) -> f64 {
    let width = bands.upper - bands.lower;
    let width = if width == 0.0 { DIVISION_EPSILON } else { width };
    ((close - bands.lower) / width).clamp(0.0, 1.0)
}

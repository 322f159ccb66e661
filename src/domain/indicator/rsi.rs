//! RSI (Relative Strength Index).
//!
//! gain = max(ΔC, 0), loss = max(-ΔC, 0), each smoothed with alpha = 1/n.
//! RS = avg_gain / avg_loss, with a zero avg_loss replaced by 1e-9 (and a
//! ratio of 1 when both averages are zero). RSI = 100 - 100/(1 + RS).
//!
//! Warmup: the first n bars are undefined (n price changes are needed).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{DIVISION_EPSILON, ExpSmoother};
use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < 2 {
        return IndicatorSeries::undefined(IndicatorType::Rsi(period), bars.len());
    }

    let mut gains = ExpSmoother::wilder(period);
    let mut losses = ExpSmoother::wilder(period);
    let mut values = Vec::with_capacity(bars.len());
    values.push(None);

    for pair in bars.windows(2) {
        let change = pair[1].close - pair[0].close;
        let avg_gain = gains.update(change.max(0.0));
        let avg_loss = losses.update((-change).max(0.0));
        values.push(match (avg_gain, avg_loss) {
            (Some(g), Some(l)) => Some(rsi_from_averages(g, l)),
            _ => None,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            1.0
        } else {
            avg_gain / DIVISION_EPSILON
        }
    } else {
        avg_gain / avg_loss
    };
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::closes_to_bars;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert!(series.values.is_empty());
    }

    #[test]
    fn rsi_single_bar() {
        let bars = closes_to_bars(&[100.0]);
        let series = calculate_rsi(&bars, 14);
        assert_eq!(series.values, vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=16).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let series = calculate_rsi(&closes_to_bars(&closes), 14);

        assert_eq!(series.values.len(), 16);
        for i in 0..14 {
            assert!(series.values[i].is_none(), "bar {} should be undefined", i);
        }
        assert!(series.values[14].is_some());
        assert!(series.values[15].is_some());
    }

    #[test]
    fn rsi_flat_prices_is_fifty() {
        let series = calculate_rsi(&closes_to_bars(&[42.0; 20]), 14);
        for v in series.values.iter().skip(14) {
            assert_eq!(*v, Some(50.0));
        }
    }

    #[test]
    fn rsi_all_gains_approaches_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&closes_to_bars(&closes), 14);
        let rsi = series.values[19].unwrap();
        assert!(rsi > 99.99 && rsi <= 100.0, "rsi = {}", rsi);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&closes_to_bars(&closes), 14);
        assert_abs_diff_eq!(series.values[19].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_known_two_period_values() {
        // changes: +2, -1, +3
        let series = calculate_rsi(&closes_to_bars(&[10.0, 12.0, 11.0, 14.0]), 2);
        assert!(series.values[1].is_none());

        // after two changes: gain 2 -> 1.0, loss 0 -> 0.5
        let g = 2.0 + 0.5 * (0.0 - 2.0);
        let l = 0.0 + 0.5 * (1.0 - 0.0);
        assert_abs_diff_eq!(
            series.values[2].unwrap(),
            100.0 - 100.0 / (1.0 + g / l),
            epsilon = 1e-12
        );

        let g2 = g + 0.5 * (3.0 - g);
        let l2 = l + 0.5 * (0.0 - l);
        assert_abs_diff_eq!(
            series.values[3].unwrap(),
            100.0 - 100.0 / (1.0 + g2 / l2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40)
            .map(|i| 100.0 + ((i * 7) % 11) as f64 - 5.0)
            .collect();
        let series = calculate_rsi(&closes_to_bars(&closes), 14);
        for rsi in series.values.iter().flatten() {
            assert!((0.0..=100.0).contains(rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&closes_to_bars(&[100.0, 101.0]), 0);
        assert_eq!(series.values, vec![None, None]);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(0));
    }
}

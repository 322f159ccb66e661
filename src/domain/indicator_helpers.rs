//! Shared helpers for indicator calculations.

/// Substitute for a zero divisor (RSI average loss, Bollinger band width).
pub const DIVISION_EPSILON: f64 = 1e-9;

/// Adjust-free exponential average.
///
/// Seeded by the first observation, then `s = s + alpha * (x - s)`. A value is
/// reported only once `min_periods` observations have been absorbed; earlier
/// updates still move the average.
#[derive(Debug, Clone)]
pub struct ExpSmoother {
    alpha: f64,
    min_periods: usize,
    value: Option<f64>,
    count: usize,
}

impl ExpSmoother {
    pub fn new(alpha: f64, min_periods: usize) -> Self {
        ExpSmoother {
            alpha,
            min_periods,
            value: None,
            count: 0,
        }
    }

    /// alpha = 2 / (span + 1), defined from the first observation.
    pub fn span(span: usize) -> Self {
        Self::new(2.0 / (span as f64 + 1.0), 1)
    }

    /// alpha = 1 / period, defined after `period` observations.
    pub fn wilder(period: usize) -> Self {
        Self::new(1.0 / period as f64, period)
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        let next = match self.value {
            None => x,
            Some(prev) => prev + self.alpha * (x - prev),
        };
        self.value = Some(next);
        self.count += 1;
        (self.count >= self.min_periods).then_some(next)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Arithmetic mean; `None` for an empty window.
pub fn mean(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Sample standard deviation (divides by N-1); `None` below two values.
pub fn sample_stddev(window: &[f64]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    let m = mean(window)?;
    let sum_sq: f64 = window.iter().map(|v| (v - m) * (v - m)).sum();
    Some((sum_sq / (window.len() - 1) as f64).sqrt())
}

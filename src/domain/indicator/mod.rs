//! Indicator engine.
//!
//! Each indicator lives in its own module and maps a bar slice to an
//! `IndicatorSeries`: one `Option` per bar, `None` while the indicator is
//! still warming up. [`compute`] runs the whole set and zips the results into
//! one `IndicatorRow` per input bar. The raw series is never modified.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod stddev;

use crate::domain::config_validation::{require_min_period, require_positive};
use crate::domain::error::SignaldeskError;
use crate::domain::ohlcv::Bar;
use crate::domain::series::Series;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Label for one computed column, shown by `signaldesk validate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorType {
    Ema(usize),
    Sma(usize),
    Rsi(usize),
    Atr(usize),
    Stddev(usize),
    Bollinger { period: usize, mult: f64 },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Bollinger { period, mult } => {
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries<T = f64> {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<T>>,
}

impl<T> IndicatorSeries<T> {
    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        IndicatorSeries {
            indicator_type,
            values: std::iter::repeat_with(|| None).take(len).collect(),
        }
    }
}

/// Which fast/slow pair drives the crossover channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovingAverage {
    #[default]
    Ema,
    Sma,
}

impl FromStr for MovingAverage {
    type Err = SignaldeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ema" => Ok(MovingAverage::Ema),
            "sma" => Ok(MovingAverage::Sma),
            _ => Err(SignaldeskError::invalid(
                "signals",
                "ma_kind",
                format!("expected ema or sma, got '{}'", s.trim()),
            )),
        }
    }
}

impl fmt::Display for MovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovingAverage::Ema => f.write_str("ema"),
            MovingAverage::Sma => f.write_str("sma"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_mult: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            ema_fast: 10,
            ema_slow: 20,
            sma_fast: 20,
            sma_slow: 50,
            rsi_period: 14,
            atr_period: 14,
            bb_period: 15,
            bb_mult: 1.5,
        }
    }
}

fn require_shorter(
    fast_key: &str,
    slow_key: &str,
    fast: usize,
    slow: usize,
) -> Result<(), SignaldeskError> {
    if fast >= slow {
        return Err(SignaldeskError::invalid(
            "indicators",
            fast_key,
            format!("{} must be shorter than {}", fast_key, slow_key),
        ));
    }
    Ok(())
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), SignaldeskError> {
        require_min_period("indicators", "ema_fast", self.ema_fast, 1)?;
        require_min_period("indicators", "ema_slow", self.ema_slow, 1)?;
        require_min_period("indicators", "sma_fast", self.sma_fast, 1)?;
        require_min_period("indicators", "sma_slow", self.sma_slow, 1)?;
        require_min_period("indicators", "rsi_period", self.rsi_period, 1)?;
        require_min_period("indicators", "atr_period", self.atr_period, 1)?;
        require_min_period("indicators", "bb_period", self.bb_period, 2)?;
        require_positive("indicators", "bb_mult", self.bb_mult)?;
        require_shorter("ema_fast", "ema_slow", self.ema_fast, self.ema_slow)?;
        require_shorter("sma_fast", "sma_slow", self.sma_fast, self.sma_slow)?;
        Ok(())
    }

    /// The columns `compute` produces, in output order.
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Ema(self.ema_fast),
            IndicatorType::Ema(self.ema_slow),
            IndicatorType::Sma(self.sma_fast),
            IndicatorType::Sma(self.sma_slow),
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Atr(self.atr_period),
            IndicatorType::Bollinger {
                period: self.bb_period,
                mult: self.bb_mult,
            },
        ]
    }
}

/// A bar plus its derived fields. `None` means undefined (warm-up).
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_pct_b: Option<f64>,
}

impl IndicatorRow {
    pub fn close(&self) -> f64 {
        self.bar.close
    }

    /// The (fast, slow) pair for `kind`, when both are defined.
    pub fn ma_pair(&self, kind: MovingAverage) -> Option<(f64, f64)> {
        match kind {
            MovingAverage::Ema => Some((self.ema_fast?, self.ema_slow?)),
            MovingAverage::Sma => Some((self.sma_fast?, self.sma_slow?)),
        }
    }

    pub fn bands(&self) -> Option<Bands> {
        Some(Bands {
            upper: self.bb_upper?,
            middle: self.bb_mid?,
            lower: self.bb_lower?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    pub symbol: String,
    pub rows: Vec<IndicatorRow>,
}

impl EnrichedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derive every indicator column for one series.
///
/// Fails only on invalid parameters; short or empty series come back with
/// undefined fields instead.
pub fn compute(series: &Series, params: &IndicatorParams) -> Result<EnrichedSeries, SignaldeskError> {
    params.validate()?;
    let bars = series.bars();

    let ema_fast = ema::calculate_ema(bars, params.ema_fast);
    let ema_slow = ema::calculate_ema(bars, params.ema_slow);
    let sma_fast = sma::calculate_sma(bars, params.sma_fast);
    let sma_slow = sma::calculate_sma(bars, params.sma_slow);
    let rsi = rsi::calculate_rsi(bars, params.rsi_period);
    let atr = atr::calculate_atr(bars, params.atr_period);
    let bollinger = bollinger::calculate_bollinger(bars, params.bb_period, params.bb_mult);

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let bands = bollinger.values[i];
            IndicatorRow {
                bar: bar.clone(),
                ema_fast: ema_fast.values[i],
                ema_slow: ema_slow.values[i],
                sma_fast: sma_fast.values[i],
                sma_slow: sma_slow.values[i],
                rsi: rsi.values[i],
                atr: atr.values[i],
                bb_mid: bands.map(|b| b.middle),
                bb_upper: bands.map(|b| b.upper),
                bb_lower: bands.map(|b| b.lower),
                bb_pct_b: bands.map(|b| bollinger::percent_b(bar.close, &b)),
            }
        })
        .collect();

    Ok(EnrichedSeries {
        symbol: series.symbol().to_string(),
        rows,
    })
}

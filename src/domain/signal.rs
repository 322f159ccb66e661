//! Signal detection.
//!
//! Two independent channels per row:
//! - the crossover channel (`Signal` plus an optional `CrossEvent` edge) over
//!   the EMA or SMA pair picked by `SignalParams::ma_kind`, which drives the
//!   backtest;
//! - the extreme channel (`ExtremeTag`s), used for reporting only.
//!
//! Row i only looks at rows i and i-1. Warm-up rows are `Flat` and never
//! produce a cross.

use crate::domain::config_validation::require_percentage;
use crate::domain::error::SignaldeskError;
use crate::domain::indicator::{IndicatorRow, MovingAverage};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    /// +1 for Long, -1 for Short, 0 for Flat.
    pub fn direction(self) -> f64 {
        match self {
            Signal::Long => 1.0,
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Signal::Flat
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Flat => "FLAT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossEvent {
    GoldenCross,
    DeathCross,
}

impl fmt::Display for CrossEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossEvent::GoldenCross => f.write_str("golden cross"),
            CrossEvent::DeathCross => f.write_str("death cross"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtremeTag {
    TouchingLowerBand,
    BreakingUpperBand,
    Oversold,
    Overbought,
}

impl fmt::Display for ExtremeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtremeTag::TouchingLowerBand => "touching lower Bollinger band",
            ExtremeTag::BreakingUpperBand => "breaking upper Bollinger band",
            ExtremeTag::Oversold => "RSI oversold",
            ExtremeTag::Overbought => "RSI overbought",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub ma_kind: MovingAverage,
}

impl Default for SignalParams {
    fn default() -> Self {
        SignalParams {
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            ma_kind: MovingAverage::Ema,
        }
    }
}

impl SignalParams {
    pub fn validate(&self) -> Result<(), SignaldeskError> {
        require_percentage("signals", "rsi_overbought", self.rsi_overbought)?;
        require_percentage("signals", "rsi_oversold", self.rsi_oversold)?;
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(SignaldeskError::invalid(
                "signals",
                "rsi_oversold",
                "rsi_oversold must be below rsi_overbought",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub signal: Signal,
    pub cross: Option<CrossEvent>,
    pub tags: Vec<ExtremeTag>,
}

impl SignalRow {
    pub fn has_tag(&self, tag: ExtremeTag) -> bool {
        self.tags.contains(&tag)
    }

    /// A row worth reporting: a cross edge or any extreme tag.
    pub fn is_event(&self) -> bool {
        self.cross.is_some() || !self.tags.is_empty()
    }
}

fn crossover_signal(row: &IndicatorRow, kind: MovingAverage) -> Signal {
    match row.ma_pair(kind) {
        Some((fast, slow)) if fast > slow => Signal::Long,
        Some((fast, slow)) if fast < slow => Signal::Short,
        _ => Signal::Flat,
    }
}

fn cross_event(
    prev: &IndicatorRow,
    cur: &IndicatorRow,
    kind: MovingAverage,
) -> Option<CrossEvent> {
    let (pf, ps) = prev.ma_pair(kind)?;
    let (cf, cs) = cur.ma_pair(kind)?;
    if pf <= ps && cf > cs {
        Some(CrossEvent::GoldenCross)
    } else if pf >= ps && cf < cs {
        Some(CrossEvent::DeathCross)
    } else {
        None
    }
}

fn extreme_tags(row: &IndicatorRow, params: &SignalParams) -> Vec<ExtremeTag> {
    let mut tags = Vec::new();
    let close = row.close();
    if row.bb_lower.is_some_and(|lower| close <= lower) {
        tags.push(ExtremeTag::TouchingLowerBand);
    }
    if row.bb_upper.is_some_and(|upper| close >= upper) {
        tags.push(ExtremeTag::BreakingUpperBand);
    }
    if let Some(rsi) = row.rsi {
        if rsi > params.rsi_overbought {
            tags.push(ExtremeTag::Overbought);
        } else if rsi < params.rsi_oversold {
            tags.push(ExtremeTag::Oversold);
        }
    }
    tags.sort();
    tags
}

/// One `SignalRow` per indicator row.
pub fn detect(rows: &[IndicatorRow], params: &SignalParams) -> Vec<SignalRow> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| SignalRow {
            signal: crossover_signal(row, params.ma_kind),
            cross: if i == 0 {
                None
            } else {
                cross_event(&rows[i - 1], row, params.ma_kind)
            },
            tags: extreme_tags(row, params),
        })
        .collect()
}

pub fn count_cross(signals: &[SignalRow], event: CrossEvent) -> usize {
    signals.iter().filter(|s| s.cross == Some(event)).count()
}

pub fn count_tag(signals: &[SignalRow], tag: ExtremeTag) -> usize {
    signals.iter().filter(|s| s.has_tag(tag)).count()
}

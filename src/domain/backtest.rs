//! Backtest simulator.
//!
//! A per-instrument state machine over `{Flat, Long, Short}`:
//! - Flat -> Long/Short when the bar's signal is non-flat; entry at the close.
//! - Long/Short -> Flat when the unrealized return reaches `take_profit` or
//!   falls to `stop_loss` (take-profit checked first). Thresholds are checked
//!   from the bar after entry, and a new position is never opened on the bar
//!   that closed the previous one.
//! - A position still open after the last bar closes at the last close.
//!
//! [`Simulation`] yields the transitions lazily so a caller can react to each
//! one; [`run_backtest`] drains it into a `BacktestResult`.

use crate::domain::config_validation::{require_negative, require_positive};
use crate::domain::error::SignaldeskError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::position::{ExitReason, Position, Side, Trade};
use crate::domain::signal::{Signal, SignalRow};

/// Slack on threshold comparisons, so a move that lands on a threshold in
/// decimal terms (100.0 -> 100.3) still triggers it after float rounding.
pub const THRESHOLD_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            take_profit: 0.003,
            stop_loss: -0.002,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SignaldeskError> {
        require_positive("backtest", "take_profit", self.take_profit)?;
        require_negative("backtest", "stop_loss", self.stop_loss)?;
        Ok(())
    }

    fn exit_reason(&self, unrealized: f64) -> Option<ExitReason> {
        if unrealized >= self.take_profit - THRESHOLD_TOLERANCE {
            Some(ExitReason::TakeProfit)
        } else if unrealized <= self.stop_loss + THRESHOLD_TOLERANCE {
            Some(ExitReason::StopLoss)
        } else {
            None
        }
    }
}

/// A state transition, tagged with the index of the bar it happened on.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Opened { index: usize, position: Position },
    Closed { index: usize, trade: Trade },
}

pub struct Simulation<'a> {
    rows: &'a [IndicatorRow],
    signals: &'a [SignalRow],
    config: &'a BacktestConfig,
    len: usize,
    index: usize,
    position: Option<Position>,
}

impl<'a> Simulation<'a> {
    pub fn new(
        rows: &'a [IndicatorRow],
        signals: &'a [SignalRow],
        config: &'a BacktestConfig,
    ) -> Self {
        Simulation {
            rows,
            signals,
            config,
            len: rows.len().min(signals.len()),
            index: 0,
            position: None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
}

fn entry_side(signal: Signal) -> Option<Side> {
    match signal {
        Signal::Long => Some(Side::Long),
        Signal::Short => Some(Side::Short),
        Signal::Flat => None,
    }
}

impl Iterator for Simulation<'_> {
    type Item = SimEvent;

    fn next(&mut self) -> Option<SimEvent> {
        loop {
            if self.index >= self.len {
                let position = self.position.take()?;
                let last = self.len - 1;
                let bar = &self.rows[last].bar;
                return Some(SimEvent::Closed {
                    index: last,
                    trade: position.close(bar.close, bar.timestamp, ExitReason::EndOfSeries),
                });
            }

            let i = self.index;
            self.index += 1;
            let bar = &self.rows[i].bar;

            match self.position.take() {
                Some(position) => {
                    let unrealized = position.unrealized_return(bar.close);
                    match self.config.exit_reason(unrealized) {
                        Some(reason) => {
                            return Some(SimEvent::Closed {
                                index: i,
                                trade: position.close(bar.close, bar.timestamp, reason),
                            });
                        }
                        None => self.position = Some(position),
                    }
                }
                None => {
                    let Some(side) = entry_side(self.signals[i].signal) else {
                        continue;
                    };
                    if bar.close <= 0.0 {
                        continue;
                    }
                    let position = Position {
                        side,
                        entry_price: bar.close,
                        entry_ts: bar.timestamp,
                    };
                    self.position = Some(position.clone());
                    return Some(SimEvent::Opened { index: i, position });
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub summary: PerformanceSummary,
    pub opened: usize,
    /// Per-bar close-to-close return, 0 on the first bar.
    pub pct_returns: Vec<f64>,
    /// Cumulative sum of `pct_returns`.
    pub buy_and_hold: Vec<f64>,
    /// Cumulative sum of previous-bar signal direction times `pct_returns`.
    pub strategy_curve: Vec<f64>,
}

impl BacktestResult {
    pub fn final_buy_and_hold(&self) -> f64 {
        self.buy_and_hold.last().copied().unwrap_or(0.0)
    }

    pub fn final_strategy_return(&self) -> f64 {
        self.strategy_curve.last().copied().unwrap_or(0.0)
    }
}

pub fn pct_returns(rows: &[IndicatorRow]) -> Vec<f64> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if i == 0 {
                return 0.0;
            }
            let prev = rows[i - 1].close();
            if prev == 0.0 {
                0.0
            } else {
                row.close() / prev - 1.0
            }
        })
        .collect()
}

fn cumulative(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

pub fn run_backtest(
    rows: &[IndicatorRow],
    signals: &[SignalRow],
    config: &BacktestConfig,
) -> Result<BacktestResult, SignaldeskError> {
    config.validate()?;
    if rows.len() != signals.len() {
        return Err(SignaldeskError::Data {
            reason: format!(
                "{} indicator rows but {} signal rows",
                rows.len(),
                signals.len()
            ),
        });
    }

    let mut opened = 0;
    let mut trades = Vec::new();
    for event in Simulation::new(rows, signals, config) {
        match event {
            SimEvent::Opened { .. } => opened += 1,
            SimEvent::Closed { trade, .. } => trades.push(trade),
        }
    }

    let returns = pct_returns(rows);
    let buy_and_hold = cumulative(returns.iter().copied());
    let strategy_curve = cumulative(returns.iter().enumerate().map(|(i, r)| {
        if i == 0 {
            0.0
        } else {
            signals[i - 1].signal.direction() * r
        }
    }));

    Ok(BacktestResult {
        summary: PerformanceSummary::compute(&trades),
        trades,
        opened,
        pct_returns: returns,
        buy_and_hold,
        strategy_curve,
    })
}

//! Open positions and closed trades.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("LONG"),
            Side::Short => f.write_str("SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    EndOfSeries,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::EndOfSeries => "end_of_series",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub entry_ts: NaiveDateTime,
}

impl Position {
    /// sign(side) × (price - entry) / entry
    pub fn unrealized_return(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) / self.entry_price
    }

    pub fn close(self, exit_price: f64, exit_ts: NaiveDateTime, exit_reason: ExitReason) -> Trade {
        Trade {
            return_pct: self.unrealized_return(exit_price),
            entry_price: self.entry_price,
            exit_price,
            side: self.side,
            entry_ts: self.entry_ts,
            exit_ts,
            exit_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_price: f64,
    pub exit_price: f64,
    pub side: Side,
    pub entry_ts: NaiveDateTime,
    pub exit_ts: NaiveDateTime,
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }
}

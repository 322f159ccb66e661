//! Performance summary over a trade log.
//!
//! Always derived from the trades on demand; nothing here is stored.

use crate::domain::position::{Side, Trade};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerformanceSummary {
    pub trade_count: usize,
    /// Sum of per-trade `return_pct`.
    pub total_return: f64,
    /// Share of trades with a positive return, 0 when there are none.
    pub win_rate: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub avg_return: f64,
    pub largest_win: f64,
    /// Most negative trade return, reported as a non-positive number.
    pub largest_loss: f64,
    pub long_trades: usize,
    pub short_trades: usize,
}

impl PerformanceSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut total_return = 0.0_f64;
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut long_trades = 0usize;

        for trade in trades {
            let r = trade.return_pct;
            total_return += r;
            if r > 0.0 {
                trades_won += 1;
                largest_win = largest_win.max(r);
            } else if r < 0.0 {
                trades_lost += 1;
                largest_loss = largest_loss.min(r);
            }
            if trade.side == Side::Long {
                long_trades += 1;
            }
        }

        let trade_count = trades.len();
        let (win_rate, avg_return) = if trade_count > 0 {
            (
                trades_won as f64 / trade_count as f64,
                total_return / trade_count as f64,
            )
        } else {
            (0.0, 0.0)
        };

        PerformanceSummary {
            trade_count,
            total_return,
            win_rate,
            trades_won,
            trades_lost,
            avg_return,
            largest_win,
            largest_loss,
            long_trades,
            short_trades: trade_count - long_trades,
        }
    }
}

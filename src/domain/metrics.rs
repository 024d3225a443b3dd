//! Performance metrics computed once a run has terminated.

use super::backtest::BacktestResult;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Floor applied to the per-trade return standard deviation.
pub const MIN_RETURN_STDDEV: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestMetrics {
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub net_return: f64,
    pub sharpe_ratio: f64,
    pub monthly_returns: Vec<f64>,
    pub final_capital: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_bars_held: f64,
}

impl BacktestMetrics {
    pub fn compute(result: &BacktestResult) -> Self {
        Self::from_parts(
            &result.trades,
            &result.monthly_returns,
            result.state.initial_capital,
            result.state.capital,
            result.state.max_drawdown,
        )
    }

    pub fn from_parts(
        trades: &[Trade],
        monthly_returns: &[f64],
        initial_capital: f64,
        final_capital: f64,
        max_drawdown: f64,
    ) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_bars_held = 0u64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else {
                trades_lost += 1;
                total_losses += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            }
            total_bars_held += u64::from(trade.bars_held);
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_bars_held = if total_trades > 0 {
            total_bars_held as f64 / total_trades as f64
        } else {
            0.0
        };

        let net_return = if initial_capital > 0.0 {
            (final_capital - initial_capital) / initial_capital
        } else {
            0.0
        };

        BacktestMetrics {
            total_trades,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            max_drawdown,
            net_return,
            sharpe_ratio: trade_sharpe(trades),
            monthly_returns: monthly_returns.to_vec(),
            final_capital,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_bars_held,
        }
    }
}

/// Mean over population stddev of per-trade returns, annualized by sqrt(252).
///
/// Annualizes a per-trade series with a per-day factor; kept for
/// comparability with earlier results.
fn trade_sharpe(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }

    let n = trades.len() as f64;
    let mean = trades.iter().map(|t| t.return_pct).sum::<f64>() / n;
    let variance = trades
        .iter()
        .map(|t| (t.return_pct - mean).powi(2))
        .sum::<f64>()
        / n;
    let stddev = variance.sqrt().max(MIN_RETURN_STDDEV);

    mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
}

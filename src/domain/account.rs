//! Account state, the single open position, and the realized trade list.
//!
//! Capital is realized-only: opening a position does not debit it, closing
//! one adds the net P&L.

use chrono::NaiveDateTime;

use super::execution::{settle, CostModel};
use super::position::{Position, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub initial_capital: f64,
    pub capital: f64,
    pub peak_capital: f64,
    pub consecutive_losses: u32,
    /// Most negative `(capital - peak) / peak` seen so far. Never positive.
    pub max_drawdown: f64,
}

impl AccountState {
    pub fn new(initial_capital: f64) -> Self {
        AccountState {
            initial_capital,
            capital: initial_capital,
            peak_capital: initial_capital,
            consecutive_losses: 0,
            max_drawdown: 0.0,
        }
    }

    /// `(capital - initial) / initial`.
    pub fn net_return(&self) -> f64 {
        if self.initial_capital > 0.0 {
            (self.capital - self.initial_capital) / self.initial_capital
        } else {
            0.0
        }
    }

    pub fn mark_to_market(&mut self, current_capital: f64) {
        if current_capital > self.peak_capital {
            self.peak_capital = current_capital;
        }
        if self.peak_capital > 0.0 {
            let drawdown = (current_capital - self.peak_capital) / self.peak_capital;
            if drawdown < self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }
}

/// Result of an entry attempt. Rejections leave the account untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenResult {
    Opened { share_count: i64 },
    AlreadyOpen,
    BelowMinimumLot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    state: AccountState,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    lot_size: i64,
}

impl Account {
    pub fn new(initial_capital: f64, lot_size: i64) -> Self {
        Account {
            state: AccountState::new(initial_capital),
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            lot_size,
        }
    }

    pub fn state(&self) -> &AccountState {
        &self.state
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Fraction of closed trades with positive net P&L, or `default` before
    /// the first close.
    pub fn win_rate(&self, default: f64) -> f64 {
        if self.trades.is_empty() {
            return default;
        }
        let wins = self.trades.iter().filter(|t| t.is_win()).count();
        wins as f64 / self.trades.len() as f64
    }

    pub fn open_position(
        &mut self,
        entry_price: f64,
        share_count: i64,
        entry_time: NaiveDateTime,
        entry_bar: usize,
    ) -> OpenResult {
        if self.position.is_some() {
            return OpenResult::AlreadyOpen;
        }
        if share_count < self.lot_size {
            return OpenResult::BelowMinimumLot;
        }

        self.position = Some(Position {
            entry_price,
            share_count,
            bars_held: 0,
            entry_time,
            entry_bar,
        });
        OpenResult::Opened { share_count }
    }

    /// Close the open position, record the trade, and settle it into capital.
    ///
    /// Returns `None` when flat.
    pub fn close_position(
        &mut self,
        exit_price: f64,
        exit_time: NaiveDateTime,
        exit_bar: usize,
        costs: &CostModel,
    ) -> Option<&Trade> {
        let position = self.position.take()?;
        let settlement = settle(position.entry_price, exit_price, position.share_count, costs);

        let basis = position.cost_basis();
        let return_pct = if basis > 0.0 {
            settlement.net_pnl / basis
        } else {
            0.0
        };

        let trade = Trade {
            entry_time: position.entry_time,
            exit_time,
            entry_bar: position.entry_bar,
            exit_bar,
            entry_price: position.entry_price,
            exit_price,
            share_count: position.share_count,
            bars_held: position.bars_held,
            gross_pnl: settlement.gross_pnl,
            costs: settlement.costs,
            tax: settlement.tax,
            pnl: settlement.net_pnl,
            return_pct,
        };

        self.state.capital += trade.pnl;
        if trade.is_win() {
            self.state.consecutive_losses = 0;
        } else {
            self.state.consecutive_losses += 1;
        }

        self.trades.push(trade);
        self.trades.last()
    }

    /// Advance the open position by one bar.
    pub fn age_position(&mut self) {
        if let Some(position) = self.position.as_mut() {
            position.bars_held += 1;
        }
    }

    /// Mark to market at the current capital and append an equity point.
    pub fn record_bar(&mut self, timestamp: NaiveDateTime) {
        let capital = self.state.capital;
        self.state.mark_to_market(capital);
        self.equity_curve.push(EquityPoint { timestamp, capital });
    }

    /// Consume the account, yielding its final parts.
    pub fn into_parts(self) -> (AccountState, Option<Position>, Vec<Trade>, Vec<EquityPoint>) {
        (self.state, self.position, self.trades, self.equity_curve)
    }
}

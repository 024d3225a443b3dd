//! Open position and closed trade records.

use chrono::NaiveDateTime;

/// The single open long position of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub share_count: i64,
    pub bars_held: u32,
    pub entry_time: NaiveDateTime,
    pub entry_bar: usize,
}

impl Position {
    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.share_count as f64
    }
}

/// A completed entry→exit cycle. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_bar: usize,
    pub exit_bar: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub share_count: i64,
    pub bars_held: u32,
    pub gross_pnl: f64,
    pub costs: f64,
    pub tax: f64,
    /// Net of costs and tax.
    pub pnl: f64,
    /// `pnl` over the entry cost basis.
    pub return_pct: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

//! Backtest engine and event loop.
//!
//! One run replays an ordered bar sequence through the strategy. Each bar
//! after the oscillator warm-up is evaluated in a fixed order:
//!
//! 1. Risk halt: consecutive losses or loss from initial capital past the
//!    configured limit ends the run. Remaining bars are never processed.
//! 2. Exit: an open position held for `max_hold_bars` is closed at the close.
//! 3. Entry: only when flat and no exit happened on this bar.
//! 4. Bookkeeping: age the position, mark to market, monthly snapshot.

use std::fmt;

use tracing::{debug, info, warn};

use super::account::{Account, AccountState, EquityPoint, OpenResult};
use super::config_validation::validate_engine_config;
use super::error::BacktestError;
use super::execution::{kelly_fraction, position_size, CostModel};
use super::indicator::rsi::calculate_rsi;
use super::ohlcv::{closes, Bar};
use super::position::{Position, Trade};
use super::strategy::{RiskLimits, StrategyParams};
use crate::ports::bar_source::BarSource;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub costs: CostModel,
    pub strategy: StrategyParams,
    pub risk: RiskLimits,
    /// Processed bars per monthly-return window.
    pub bars_per_month: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_capital: 1_000_000.0,
            costs: CostModel::default(),
            strategy: StrategyParams::default(),
            risk: RiskLimits::default(),
            bars_per_month: 21,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HaltReason {
    ConsecutiveLosses { count: u32 },
    LossLimit { loss_fraction: f64 },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::ConsecutiveLosses { count } => {
                write!(f, "{} consecutive losing trades", count)
            }
            HaltReason::LossLimit { loss_fraction } => {
                write!(f, "loss of {:.2}% from initial capital", -loss_fraction * 100.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// Every bar was processed.
    Completed,
    /// The circuit breaker tripped before `bar_index` was evaluated.
    Halted { reason: HaltReason, bar_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub outcome: RunOutcome,
    pub state: AccountState,
    pub trades: Vec<Trade>,
    /// Still open when the bars ran out or the run halted. Never force-closed.
    pub open_position: Option<Position>,
    pub equity_curve: Vec<EquityPoint>,
    pub monthly_returns: Vec<f64>,
    pub bars_processed: usize,
}

impl BacktestResult {
    pub fn is_halted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Halted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: EngineConfig,
}

impl BacktestEngine {
    /// Validate `config` up front; the loop assumes sane bounds.
    pub fn new(config: EngineConfig) -> Result<Self, BacktestError> {
        validate_engine_config(&config)?;
        Ok(BacktestEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run_source(&self, source: &dyn BarSource) -> Result<BacktestResult, BacktestError> {
        let bars = source.load_bars()?;
        Ok(self.run(&bars))
    }

    pub fn run(&self, bars: &[Bar]) -> BacktestResult {
        let params = &self.config.strategy;
        let rsi = calculate_rsi(&closes(bars), params.rsi_period);

        let mut account = Account::new(self.config.initial_capital, params.lot_size);
        let mut monthly = MonthlyReturns::new(self.config.initial_capital, self.config.bars_per_month);
        let mut outcome = RunOutcome::Completed;
        let mut bars_processed = 0usize;

        for (i, bar) in bars.iter().enumerate().skip(rsi.offset) {
            if let Some(reason) = check_halt(account.state(), &self.config.risk) {
                warn!(bar = i, %reason, "circuit breaker tripped, halting run");
                outcome = RunOutcome::Halted {
                    reason,
                    bar_index: i,
                };
                break;
            }

            let mut exited = false;
            if account
                .position()
                .is_some_and(|p| p.bars_held >= params.max_hold_bars)
            {
                if let Some(trade) =
                    account.close_position(bar.close, bar.timestamp, i, &self.config.costs)
                {
                    debug!(
                        bar = i,
                        price = trade.exit_price,
                        pnl = trade.pnl,
                        bars_held = trade.bars_held,
                        "exit"
                    );
                }
                exited = true;
            }

            if !exited && !account.has_position() {
                if let Some(value) = rsi.at_bar(i) {
                    if params.is_entry_signal(value, bar.volume) {
                        self.try_enter(&mut account, bar, i, value);
                    }
                }
            }

            account.age_position();
            account.record_bar(bar.timestamp);
            monthly.on_bar(account.state().capital);
            bars_processed += 1;
        }

        let (state, open_position, trades, equity_curve) = account.into_parts();

        info!(
            bars = bars_processed,
            trades = trades.len(),
            capital = state.capital,
            halted = matches!(outcome, RunOutcome::Halted { .. }),
            "backtest finished"
        );

        BacktestResult {
            outcome,
            state,
            trades,
            open_position,
            equity_curve,
            monthly_returns: monthly.into_returns(),
            bars_processed,
        }
    }

    fn try_enter(&self, account: &mut Account, bar: &Bar, bar_index: usize, oscillator: f64) {
        let params = &self.config.strategy;
        let win_rate = account.win_rate(params.default_win_rate);
        let fraction = kelly_fraction(win_rate, params.kelly_offset, params.kelly_cap);
        let shares = position_size(account.state().capital, fraction, bar.close, params.lot_size);

        match account.open_position(bar.close, shares, bar.timestamp, bar_index) {
            OpenResult::Opened { share_count } => debug!(
                bar = bar_index,
                price = bar.close,
                shares = share_count,
                rsi = oscillator,
                kelly = fraction,
                "entry"
            ),
            OpenResult::BelowMinimumLot => debug!(
                bar = bar_index,
                shares,
                kelly = fraction,
                "entry signal skipped, size below one lot"
            ),
            OpenResult::AlreadyOpen => {}
        }
    }
}

fn check_halt(state: &AccountState, risk: &RiskLimits) -> Option<HaltReason> {
    if state.consecutive_losses >= risk.max_consecutive_losses {
        return Some(HaltReason::ConsecutiveLosses {
            count: state.consecutive_losses,
        });
    }
    let loss_fraction = state.net_return();
    if loss_fraction < -risk.max_loss_fraction {
        return Some(HaltReason::LossLimit { loss_fraction });
    }
    None
}

/// Capital change over fixed windows of processed bars. Each window is
/// measured from the capital at its start; partial trailing windows are dropped.
struct MonthlyReturns {
    bars_per_month: usize,
    bars_in_window: usize,
    window_start: f64,
    returns: Vec<f64>,
}

impl MonthlyReturns {
    fn new(initial_capital: f64, bars_per_month: usize) -> Self {
        MonthlyReturns {
            bars_per_month,
            bars_in_window: 0,
            window_start: initial_capital,
            returns: Vec::new(),
        }
    }

    fn on_bar(&mut self, capital: f64) {
        self.bars_in_window += 1;
        if self.bars_in_window < self.bars_per_month {
            return;
        }
        let ret = if self.window_start > 0.0 {
            (capital - self.window_start) / self.window_start
        } else {
            0.0
        };
        self.returns.push(ret);
        self.window_start = capital;
        self.bars_in_window = 0;
    }

    fn into_returns(self) -> Vec<f64> {
        self.returns
    }
}

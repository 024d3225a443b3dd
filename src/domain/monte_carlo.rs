//! Independent repeated runs over freshly generated bar sequences.
//!
//! Each run owns its account and trade list. Runs are spread over scoped
//! worker threads; results come back through one channel and are ordered by
//! run index, so a summary does not depend on thread scheduling.

use std::sync::mpsc;
use std::thread;

use tracing::{debug, info};

use super::backtest::{BacktestEngine, RunOutcome};
use super::error::BacktestError;
use super::metrics::BacktestMetrics;
use crate::ports::bar_source::BarSource;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run: usize,
    pub outcome: RunOutcome,
    pub metrics: BacktestMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloSummary {
    pub runs: Vec<RunSummary>,
    pub mean_net_return: f64,
    pub mean_win_rate: f64,
    pub mean_sharpe: f64,
    /// Most negative max drawdown across runs.
    pub worst_drawdown: f64,
    pub halted_runs: usize,
}

impl MonteCarloSummary {
    pub fn from_runs(runs: Vec<RunSummary>) -> Self {
        let mean_net_return = mean_of(&runs, |m| m.net_return);
        let mean_win_rate = mean_of(&runs, |m| m.win_rate);
        let mean_sharpe = mean_of(&runs, |m| m.sharpe_ratio);
        let worst_drawdown = runs
            .iter()
            .map(|r| r.metrics.max_drawdown)
            .fold(0.0_f64, f64::min);
        let halted_runs = runs
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::Halted { .. }))
            .count();

        MonteCarloSummary {
            runs,
            mean_net_return,
            mean_win_rate,
            mean_sharpe,
            worst_drawdown,
            halted_runs,
        }
    }
}

fn mean_of(runs: &[RunSummary], f: impl Fn(&BacktestMetrics) -> f64) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().map(|r| f(&r.metrics)).sum::<f64>() / runs.len() as f64
}

/// Execute `runs` backtests, building run `i`'s bars with `make_source(i)`.
///
/// The first failing run (by index) aborts the summary with its error.
pub fn run_monte_carlo<F, S>(
    engine: &BacktestEngine,
    runs: usize,
    workers: usize,
    make_source: F,
) -> Result<MonteCarloSummary, BacktestError>
where
    F: Fn(usize) -> S + Sync,
    S: BarSource,
{
    let workers = workers.clamp(1, runs.max(1));
    info!(runs, workers, "starting monte carlo");

    let (tx, rx) = mpsc::channel::<(usize, Result<RunSummary, BacktestError>)>();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let make_source = &make_source;
            scope.spawn(move || {
                for run in (worker..runs).step_by(workers) {
                    let source = make_source(run);
                    let summary = engine.run_source(&source).map(|result| RunSummary {
                        run,
                        outcome: result.outcome,
                        metrics: BacktestMetrics::compute(&result),
                    });
                    debug!(worker, run, "run finished");
                    if tx.send((run, summary)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);

    let mut collected: Vec<(usize, Result<RunSummary, BacktestError>)> = rx.into_iter().collect();
    collected.sort_by_key(|(run, _)| *run);

    let mut summaries = Vec::with_capacity(collected.len());
    for (_, summary) in collected {
        summaries.push(summary?);
    }

    Ok(MonteCarloSummary::from_runs(summaries))
}

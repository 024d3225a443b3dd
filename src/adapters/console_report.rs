//! Plain-text summary written to stderr.

use std::fmt::Write as _;

use crate::domain::backtest::{BacktestResult, RunOutcome};
use crate::domain::error::BacktestError;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::monte_carlo::MonteCarloSummary;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct ConsoleReport;

impl ConsoleReport {
    pub fn render(result: &BacktestResult, metrics: &BacktestMetrics) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n=== Backtest Results ===");
        let _ = writeln!(out, "Outcome:          {}", outcome_label(&result.outcome));
        let _ = writeln!(out, "Bars Processed:   {}", result.bars_processed);
        let _ = writeln!(out, "Initial Capital:  {:.2}", result.state.initial_capital);
        let _ = writeln!(out, "Final Capital:    {:.2}", metrics.final_capital);
        let _ = writeln!(out, "Net Return:       {:.2}%", metrics.net_return * 100.0);
        let _ = writeln!(out, "Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
        let _ = writeln!(out, "Max Drawdown:     {:.2}%", metrics.max_drawdown * 100.0);
        let _ = writeln!(out, "Total Trades:     {}", metrics.total_trades);
        let _ = writeln!(out, "Win Rate:         {:.1}%", metrics.win_rate * 100.0);
        let _ = writeln!(out, "Profit Factor:    {:.2}", metrics.profit_factor);
        let _ = writeln!(out, "Avg Win:          {:.2}", metrics.avg_win);
        let _ = writeln!(out, "Avg Loss:         {:.2}", metrics.avg_loss);
        let _ = writeln!(out, "Avg Bars Held:    {:.1}", metrics.avg_bars_held);
        let _ = writeln!(out, "Consec. Losses:   {}", result.state.consecutive_losses);

        if let Some(pos) = &result.open_position {
            let _ = writeln!(
                out,
                "Open Position:    {} shares @ {:.2} since {}",
                pos.share_count, pos.entry_price, pos.entry_time
            );
        }

        if !metrics.monthly_returns.is_empty() {
            let _ = writeln!(out, "\n=== Monthly Returns ===");
            for (month, ret) in metrics.monthly_returns.iter().enumerate() {
                let _ = writeln!(out, "  {:>3}: {:>7.2}%", month + 1, ret * 100.0);
            }
        }
        out
    }

    pub fn render_monte_carlo(summary: &MonteCarloSummary) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n=== Monte Carlo ({} runs) ===", summary.runs.len());
        let _ = writeln!(out, "Mean Net Return:  {:.2}%", summary.mean_net_return * 100.0);
        let _ = writeln!(out, "Mean Win Rate:    {:.1}%", summary.mean_win_rate * 100.0);
        let _ = writeln!(out, "Mean Sharpe:      {:.2}", summary.mean_sharpe);
        let _ = writeln!(out, "Worst Drawdown:   {:.2}%", summary.worst_drawdown * 100.0);
        let _ = writeln!(out, "Halted Runs:      {}", summary.halted_runs);
        out
    }
}

fn outcome_label(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed => "completed".to_string(),
        RunOutcome::Halted { reason, bar_index } => {
            format!("halted at bar {} ({})", bar_index, reason)
        }
    }
}

impl ReportPort for ConsoleReport {
    fn write(&self, result: &BacktestResult, metrics: &BacktestMetrics) -> Result<(), BacktestError> {
        eprint!("{}", Self::render(result, metrics));
        Ok(())
    }

    fn write_monte_carlo(&self, summary: &MonteCarloSummary) -> Result<(), BacktestError> {
        eprint!("{}", Self::render_monte_carlo(summary));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountState;
    use crate::domain::backtest::HaltReason;

    fn result(outcome: RunOutcome) -> BacktestResult {
        BacktestResult {
            outcome,
            state: AccountState::new(50_000.0),
            trades: vec![],
            open_position: None,
            equity_curve: vec![],
            monthly_returns: vec![0.01, -0.005],
            bars_processed: 42,
        }
    }

    #[test]
    fn render_completed_run() {
        let r = result(RunOutcome::Completed);
        let m = BacktestMetrics::compute(&r);
        let text = ConsoleReport::render(&r, &m);
        assert!(text.contains("Outcome:          completed"));
        assert!(text.contains("Bars Processed:   42"));
        assert!(text.contains("Final Capital:    50000.00"));
        assert!(text.contains("=== Monthly Returns ==="));
        assert!(text.contains("-0.50%"));
        assert!(!text.contains("Open Position"));
    }

    #[test]
    fn render_halted_run_names_reason() {
        let r = result(RunOutcome::Halted {
            reason: HaltReason::ConsecutiveLosses { count: 5 },
            bar_index: 120,
        });
        let m = BacktestMetrics::compute(&r);
        let text = ConsoleReport::render(&r, &m);
        assert!(text.contains("halted at bar 120 (5 consecutive losing trades)"));
    }

    #[test]
    fn render_monte_carlo_summary() {
        let summary = MonteCarloSummary::from_runs(vec![]);
        let text = ConsoleReport::render_monte_carlo(&summary);
        assert!(text.contains("=== Monte Carlo (0 runs) ==="));
        assert!(text.contains("Halted Runs:      0"));
    }
}

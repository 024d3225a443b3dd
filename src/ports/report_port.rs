//! Report port trait for consumers of finished runs.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::monte_carlo::MonteCarloSummary;

pub trait ReportPort {
    fn write(&self, result: &BacktestResult, metrics: &BacktestMetrics) -> Result<(), BacktestError>;

    fn write_monte_carlo(&self, summary: &MonteCarloSummary) -> Result<(), BacktestError>;
}

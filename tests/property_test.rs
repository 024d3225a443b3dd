//! Property tests over random bar sequences and engine settings.

mod common;

use approx::assert_abs_diff_eq;
use barsim::domain::backtest::{BacktestEngine, BacktestResult, EngineConfig, RunOutcome};
use barsim::domain::execution::CostModel;
use barsim::domain::indicator::rsi::calculate_rsi;
use barsim::domain::metrics::BacktestMetrics;
use barsim::domain::strategy::{RiskLimits, StrategyParams};
use common::*;
use proptest::prelude::*;

fn bar_points() -> impl Strategy<Value = Vec<(f64, i64)>> {
    prop::collection::vec(
        (
            5.0f64..200.0,
            prop_oneof![Just(LOW_VOLUME), Just(HIGH_VOLUME)],
        ),
        0..250,
    )
}

fn engine_config() -> impl Strategy<Value = EngineConfig> {
    (1usize..6, 10.0f64..100.0, 1u32..6, 1u32..6, 0.01f64..0.5).prop_map(
        |(rsi_period, oversold_threshold, max_hold_bars, max_consecutive_losses, max_loss)| {
            EngineConfig {
                initial_capital: 1_000_000.0,
                costs: CostModel::default(),
                strategy: StrategyParams {
                    rsi_period,
                    oversold_threshold,
                    volume_floor: 1_000_000,
                    max_hold_bars,
                    ..StrategyParams::default()
                },
                risk: RiskLimits {
                    max_consecutive_losses,
                    max_loss_fraction: max_loss,
                },
                bars_per_month: 5,
            }
        },
    )
}

fn run(config: EngineConfig, points: &[(f64, i64)]) -> BacktestResult {
    BacktestEngine::new(config).unwrap().run(&bars_from(points))
}

proptest! {
    #[test]
    fn prop_rsi_bounded(
        closes in prop::collection::vec(-1.0e6f64..1.0e6, 0..200),
        period in 1usize..30,
    ) {
        let series = calculate_rsi(&closes, period);
        for v in &series.values {
            prop_assert!((0.0..=100.0).contains(v), "rsi {} out of range", v);
        }
        if closes.len() > period + 1 {
            prop_assert_eq!(series.len(), closes.len() - 1 - period);
        } else {
            prop_assert!(series.is_empty());
        }
    }

    #[test]
    fn prop_trades_at_most_half_of_processed_bars(
        config in engine_config(),
        points in bar_points(),
    ) {
        let result = run(config, &points);
        prop_assert!(result.trades.len() <= result.bars_processed / 2);
    }

    #[test]
    fn prop_loss_streak_matches_trade_list(
        config in engine_config(),
        points in bar_points(),
    ) {
        let result = run(config, &points);
        let trailing = result.trades.iter().rev().take_while(|t| !t.is_win()).count();
        prop_assert_eq!(result.state.consecutive_losses as usize, trailing);
    }

    #[test]
    fn prop_no_activity_after_halt(
        config in engine_config(),
        points in bar_points(),
    ) {
        let result = run(config, &points);
        if let RunOutcome::Halted { bar_index, .. } = result.outcome {
            prop_assert!(result.trades.iter().all(|t| t.exit_bar < bar_index));
            if let Some(pos) = &result.open_position {
                prop_assert!(pos.entry_bar < bar_index);
            }
            prop_assert!(result.equity_curve.len() == result.bars_processed);
        }
    }

    #[test]
    fn prop_max_drawdown_is_running_peak_minimum(
        config in engine_config(),
        points in bar_points(),
    ) {
        let result = run(config, &points);
        let mut peak = result.state.initial_capital;
        let mut expected = 0.0_f64;
        for point in &result.equity_curve {
            peak = peak.max(point.capital);
            expected = expected.min((point.capital - peak) / peak);
        }
        prop_assert!(result.state.max_drawdown <= 0.0);
        assert_abs_diff_eq!(result.state.max_drawdown, expected, epsilon = 1e-12);
    }

    #[test]
    fn prop_capital_is_initial_plus_realized_pnl(
        config in engine_config(),
        points in bar_points(),
    ) {
        let result = run(config, &points);
        let realized: f64 = result.trades.iter().map(|t| t.pnl).sum();
        assert_abs_diff_eq!(
            result.state.capital,
            result.state.initial_capital + realized,
            epsilon = 1e-6
        );
    }

    #[test]
    fn prop_metrics_idempotent(
        config in engine_config(),
        points in bar_points(),
    ) {
        let result = run(config, &points);
        let first = BacktestMetrics::compute(&result);
        let second = BacktestMetrics::compute(&result);
        prop_assert_eq!(first, second);
    }
}

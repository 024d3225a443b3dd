#![allow(dead_code)]

use barsim::domain::backtest::EngineConfig;
use barsim::domain::error::BacktestError;
use barsim::domain::execution::CostModel;
pub use barsim::domain::ohlcv::Bar;
use barsim::domain::strategy::StrategyParams;
use barsim::ports::bar_source::BarSource;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const HIGH_VOLUME: i64 = 3_000_000;
pub const LOW_VOLUME: i64 = 500_000;

/// Serves a fixed bar sequence; substitutes for random data in tests.
pub struct FixtureSource {
    pub bars: Vec<Bar>,
}

impl FixtureSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }
}

impl BarSource for FixtureSource {
    fn load_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        Ok(self.bars.clone())
    }
}

pub struct FailingSource {
    pub reason: String,
}

impl BarSource for FailingSource {
    fn load_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        Err(BacktestError::Data {
            reason: self.reason.clone(),
        })
    }
}

pub fn timestamp(index: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap()
        + Duration::days(index as i64)
}

pub fn make_bar(index: usize, close: f64, volume: i64) -> Bar {
    Bar {
        timestamp: timestamp(index),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// Bars from `(close, volume)` pairs, one day apart.
pub fn bars_from(points: &[(f64, i64)]) -> Vec<Bar> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(close, volume))| make_bar(i, close, volume))
        .collect()
}

/// A 2-bar oscillator whose entries are gated by volume alone: every
/// high-volume bar while flat is an entry, and positions close on the next bar.
pub fn volume_gated_config(costs: CostModel) -> EngineConfig {
    EngineConfig {
        initial_capital: 1_000_000.0,
        costs,
        strategy: StrategyParams {
            rsi_period: 2,
            oversold_threshold: 100.0,
            volume_floor: 1_000_000,
            max_hold_bars: 1,
            ..StrategyParams::default()
        },
        ..EngineConfig::default()
    }
}

/// Three low-volume warm-up bars for a 2-bar oscillator.
pub fn warm_up(price: f64) -> Vec<(f64, i64)> {
    vec![(price, LOW_VOLUME); 3]
}

/// Entry at `entry`, exit one bar later at `exit`, repeated `cycles` times.
pub fn round_trips(entry: f64, exit: f64, cycles: usize) -> Vec<(f64, i64)> {
    (0..cycles)
        .flat_map(|_| [(entry, HIGH_VOLUME), (exit, LOW_VOLUME)])
        .collect()
}

//! Configuration validation.
//!
//! Runs before any bar is processed; the engine loop assumes these bounds.

use crate::domain::backtest::EngineConfig;
use crate::domain::error::BacktestError;

pub fn validate_engine_config(config: &EngineConfig) -> Result<(), BacktestError> {
    validate_capital(config)?;
    validate_costs(config)?;
    validate_strategy(config)?;
    validate_risk(config)?;
    Ok(())
}

fn validate_capital(config: &EngineConfig) -> Result<(), BacktestError> {
    require_positive("backtest", "initial_capital", config.initial_capital)?;
    if config.bars_per_month < 1 {
        return Err(BacktestError::invalid(
            "backtest",
            "bars_per_month",
            "bars_per_month must be at least 1",
        ));
    }
    Ok(())
}

fn validate_costs(config: &EngineConfig) -> Result<(), BacktestError> {
    let costs = &config.costs;
    require_rate("backtest", "commission_rate", costs.commission_rate)?;
    require_rate("backtest", "slippage_rate", costs.slippage_rate)?;
    require_fraction("backtest", "tax_rate", costs.tax_rate)?;
    Ok(())
}

fn validate_strategy(config: &EngineConfig) -> Result<(), BacktestError> {
    let s = &config.strategy;
    if s.rsi_period < 1 {
        return Err(BacktestError::invalid(
            "strategy",
            "rsi_period",
            "rsi_period must be at least 1",
        ));
    }
    if !(s.oversold_threshold > 0.0 && s.oversold_threshold <= 100.0) {
        return Err(BacktestError::invalid(
            "strategy",
            "oversold_threshold",
            "oversold_threshold must be in (0, 100]",
        ));
    }
    if s.volume_floor < 0 {
        return Err(BacktestError::invalid(
            "strategy",
            "volume_floor",
            "volume_floor must be non-negative",
        ));
    }
    if s.max_hold_bars < 1 {
        return Err(BacktestError::invalid(
            "strategy",
            "max_hold_bars",
            "max_hold_bars must be at least 1",
        ));
    }
    if s.lot_size < 1 {
        return Err(BacktestError::invalid(
            "strategy",
            "lot_size",
            "lot_size must be at least 1",
        ));
    }
    require_fraction("strategy", "kelly_offset", s.kelly_offset)?;
    require_fraction("strategy", "kelly_cap", s.kelly_cap)?;
    require_fraction("strategy", "default_win_rate", s.default_win_rate)?;
    Ok(())
}

fn validate_risk(config: &EngineConfig) -> Result<(), BacktestError> {
    let r = &config.risk;
    if r.max_consecutive_losses < 1 {
        return Err(BacktestError::invalid(
            "risk",
            "max_consecutive_losses",
            "max_consecutive_losses must be at least 1",
        ));
    }
    if !(r.max_loss_fraction > 0.0 && r.max_loss_fraction <= 1.0) {
        return Err(BacktestError::invalid(
            "risk",
            "max_loss_fraction",
            "max_loss_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}

/// `value > 0` and finite.
pub fn require_positive(section: &str, key: &str, value: f64) -> Result<(), BacktestError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BacktestError::invalid(
            section,
            key,
            format!("{} must be positive", key),
        ))
    }
}

/// `value` in `[0, 1)`.
pub fn require_rate(section: &str, key: &str, value: f64) -> Result<(), BacktestError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(BacktestError::invalid(
            section,
            key,
            format!("{} must be in [0, 1)", key),
        ))
    }
}

/// `value` in `[0, 1]`.
pub fn require_fraction(section: &str, key: &str, value: f64) -> Result<(), BacktestError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BacktestError::invalid(
            section,
            key,
            format!("{} must be in [0, 1]", key),
        ))
    }
}

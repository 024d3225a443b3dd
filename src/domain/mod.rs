//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod position;
pub mod account;
pub mod execution;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod monte_carlo;
pub mod config_validation;
pub mod error;

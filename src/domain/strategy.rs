//! Oversold-entry, fixed-hold strategy parameters and risk limits.

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub rsi_period: usize,
    /// Enter when the oscillator is strictly below this value.
    pub oversold_threshold: f64,
    /// Enter only when bar volume is strictly above this value.
    pub volume_floor: i64,
    pub max_hold_bars: u32,
    pub lot_size: i64,
    pub kelly_offset: f64,
    pub kelly_cap: f64,
    /// Win rate assumed for sizing before any trade has closed.
    pub default_win_rate: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            rsi_period: 14,
            oversold_threshold: 30.0,
            volume_floor: 2_000_000,
            max_hold_bars: 20,
            lot_size: 100,
            kelly_offset: 0.45,
            kelly_cap: 0.05,
            default_win_rate: 0.5,
        }
    }
}

impl StrategyParams {
    pub fn is_entry_signal(&self, oscillator: f64, volume: i64) -> bool {
        oscillator < self.oversold_threshold && volume > self.volume_floor
    }
}

/// Circuit-breaker thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    pub max_consecutive_losses: u32,
    /// Halt once `(capital - initial) / initial < -max_loss_fraction`.
    pub max_loss_fraction: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        RiskLimits {
            max_consecutive_losses: 5,
            max_loss_fraction: 0.10,
        }
    }
}

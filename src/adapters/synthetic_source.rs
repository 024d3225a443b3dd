//! Seeded random-walk bar generator.
//!
//! Walks calendar days from `start_date`, skipping weekends, and emits
//! `bars_per_day` evenly spaced bars per session. The first and last bar of
//! each session move more and trade more than mid-session bars.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::domain::config_validation::require_positive;
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::bar_source::BarSource;

const MIN_PRICE: f64 = 0.01;
const EDGE_VOLUME_BOOST: f64 = 1.5;

/// A century of calendar days.
pub const MAX_DAYS: usize = 36_525;
/// Upper bound on bars held in memory for one run.
pub const MAX_BARS: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub start_date: NaiveDate,
    /// Calendar days to walk, weekends included.
    pub days: usize,
    pub start_price: f64,
    /// Maximum fractional close-to-close move of a mid-session bar.
    pub volatility: f64,
    /// Volatility multiplier for the first and last bar of a session.
    pub edge_multiplier: f64,
    pub bars_per_day: usize,
    pub bar_minutes: u32,
    pub session_open: NaiveTime,
    pub base_volume: i64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 252,
            start_price: 38.5,
            volatility: 0.01,
            edge_multiplier: 1.5,
            bars_per_day: 1,
            bar_minutes: 30,
            session_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            base_volume: 3_000_000,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        require_positive("data", "start_price", self.start_price)?;
        if !(self.volatility > 0.0 && self.volatility < 1.0) {
            return Err(BacktestError::invalid(
                "data",
                "volatility",
                "volatility must be in (0, 1)",
            ));
        }
        if !(self.edge_multiplier >= 1.0 && self.volatility * self.edge_multiplier < 1.0) {
            return Err(BacktestError::invalid(
                "data",
                "edge_multiplier",
                "edge_multiplier must be at least 1 and keep edge moves below 100%",
            ));
        }
        if self.bars_per_day < 1 {
            return Err(BacktestError::invalid(
                "data",
                "bars_per_day",
                "bars_per_day must be at least 1",
            ));
        }
        if self.bar_minutes < 1 {
            return Err(BacktestError::invalid(
                "data",
                "bar_minutes",
                "bar_minutes must be at least 1",
            ));
        }
        let open_minutes = i64::from(self.session_open.hour() * 60 + self.session_open.minute());
        let session_minutes = (self.bars_per_day as i64 - 1) * i64::from(self.bar_minutes);
        if open_minutes + session_minutes >= 24 * 60 {
            return Err(BacktestError::invalid(
                "data",
                "bars_per_day",
                "session must end before midnight",
            ));
        }
        check_span(self.start_date, self.days, self.bars_per_day)?;
        if self.base_volume < 1 {
            return Err(BacktestError::invalid(
                "data",
                "base_volume",
                "base_volume must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Bar count for `days` sessions of `bars_per_day`, rejecting spans past
/// [`MAX_DAYS`], [`MAX_BARS`] or the calendar's range.
fn check_span(start_date: NaiveDate, days: usize, bars_per_day: usize) -> Result<usize, BacktestError> {
    if days > MAX_DAYS {
        return Err(BacktestError::invalid(
            "data",
            "days",
            format!("days must be at most {}", MAX_DAYS),
        ));
    }
    let bars = days
        .checked_mul(bars_per_day)
        .filter(|&n| n <= MAX_BARS)
        .ok_or_else(|| {
            BacktestError::invalid(
                "data",
                "days",
                format!("days * bars_per_day must be at most {}", MAX_BARS),
            )
        })?;
    if start_date.checked_add_days(Days::new(days as u64)).is_none() {
        return Err(BacktestError::invalid(
            "data",
            "days",
            "date range runs past the supported calendar",
        ));
    }
    Ok(bars)
}

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    config: GeneratorConfig,
}

impl SyntheticSource {
    pub fn new(config: GeneratorConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Same generator with a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut config = self.config.clone();
        config.seed = seed;
        Self { config }
    }

    /// Bars for `days` calendar days from the configured start date.
    pub fn generate(&self, days: usize) -> Result<Vec<Bar>, BacktestError> {
        let c = &self.config;
        let capacity = check_span(c.start_date, days, c.bars_per_day)?;
        let mut rng = ChaCha8Rng::seed_from_u64(c.seed);
        let mut bars = Vec::with_capacity(capacity);
        let mut price = c.start_price;

        for day in 0..days {
            let Some(date) = c.start_date.checked_add_days(Days::new(day as u64)) else {
                break;
            };
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let open_at = NaiveDateTime::new(date, c.session_open);

            for slot in 0..c.bars_per_day {
                let edge = slot == 0 || slot + 1 == c.bars_per_day;
                let vol = if edge {
                    c.volatility * c.edge_multiplier
                } else {
                    c.volatility
                };

                let open = price;
                let close = (open * (1.0 + rng.gen_range(-vol..=vol))).max(MIN_PRICE);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..=vol / 2.0));
                let low = (open.min(close) * (1.0 - rng.gen_range(0.0..=vol / 2.0))).max(MIN_PRICE);

                let volume_scale = rng.gen_range(0.5..1.5) * if edge { EDGE_VOLUME_BOOST } else { 1.0 };
                let volume = ((c.base_volume as f64 * volume_scale) as i64).max(1);

                bars.push(Bar {
                    timestamp: open_at + Duration::minutes(slot as i64 * i64::from(c.bar_minutes)),
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
                price = close;
            }
        }

        debug!(days, bars = bars.len(), seed = c.seed, "generated synthetic bars");
        Ok(bars)
    }
}

impl BarSource for SyntheticSource {
    fn load_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        self.generate(self.config.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(bars_per_day: usize) -> SyntheticSource {
        SyntheticSource::new(GeneratorConfig {
            bars_per_day,
            ..GeneratorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn skips_weekends() {
        // 2024-01-01 is a Monday; two calendar weeks hold ten sessions
        let bars = source(1).generate(14).unwrap();
        assert_eq!(bars.len(), 10);
        for bar in &bars {
            assert!(!matches!(bar.timestamp.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn timestamps_strictly_increasing() {
        let bars = source(13).generate(30).unwrap();
        assert!(!bars.is_empty());
        for w in bars.windows(2) {
            assert!(w[1].timestamp > w[0].timestamp);
        }
    }

    #[test]
    fn intraday_spacing_follows_bar_minutes() {
        let bars = source(3).generate(1).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(bars[1].timestamp.time(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(bars[2].timestamp.time(), NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn same_seed_same_bars() {
        let a = source(4).generate(20).unwrap();
        let b = source(4).generate(20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_different_bars() {
        let a = source(1).generate(20).unwrap();
        let b = source(1).with_seed(7).generate(20).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bars_are_well_formed() {
        let bars = source(13).generate(60).unwrap();
        let mut prev_close = GeneratorConfig::default().start_price;
        for bar in &bars {
            assert!(bar.volume > 0);
            assert!(bar.low > 0.0);
            assert!(bar.high >= bar.open.max(bar.close));
            assert!(bar.low <= bar.open.min(bar.close));
            assert_eq!(bar.open, prev_close);
            prev_close = bar.close;
        }
    }

    #[test]
    fn moves_bounded_by_volatility() {
        let config = GeneratorConfig::default();
        let src = source(13);
        let bars = src.generate(20).unwrap();
        let edge_bound = config.volatility * config.edge_multiplier;
        for bar in &bars {
            let change = (bar.close / bar.open - 1.0).abs();
            assert!(change <= edge_bound + 1e-12, "move {} exceeds bound", change);
        }
    }

    #[test]
    fn load_bars_uses_configured_days() {
        let src = source(1);
        assert_eq!(src.load_bars().unwrap(), src.generate(252).unwrap());
    }

    #[test]
    fn rejects_non_positive_price() {
        let config = GeneratorConfig {
            start_price: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            SyntheticSource::new(config),
            Err(BacktestError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn rejects_zero_volatility() {
        let config = GeneratorConfig {
            volatility: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(SyntheticSource::new(config).is_err());
    }

    #[test]
    fn rejects_session_past_midnight() {
        let config = GeneratorConfig {
            bars_per_day: 40,
            bar_minutes: 30,
            ..GeneratorConfig::default()
        };
        assert!(SyntheticSource::new(config).is_err());
    }

    #[test]
    fn rejects_days_past_bound() {
        let config = GeneratorConfig {
            days: MAX_DAYS + 1,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            SyntheticSource::new(config),
            Err(BacktestError::ConfigInvalid { ref key, .. }) if key == "days"
        ));
    }

    #[test]
    fn rejects_too_many_bars() {
        let config = GeneratorConfig {
            days: MAX_DAYS,
            bars_per_day: 200,
            bar_minutes: 1,
            ..GeneratorConfig::default()
        };
        assert!(MAX_DAYS * 200 > MAX_BARS);
        assert!(matches!(
            SyntheticSource::new(config),
            Err(BacktestError::ConfigInvalid { ref key, ref reason, .. })
                if key == "days" && reason.contains("bars_per_day")
        ));
    }

    #[test]
    fn generate_huge_span_is_config_error() {
        let src = source(1);
        for days in [usize::MAX, 200_000_000] {
            assert!(matches!(
                src.generate(days),
                Err(BacktestError::ConfigInvalid { .. })
            ));
        }
    }

    #[test]
    fn session_edges_move_and_trade_more() {
        let config = GeneratorConfig {
            bars_per_day: 5,
            ..GeneratorConfig::default()
        };
        let bars = SyntheticSource::new(config.clone()).unwrap().generate(280).unwrap();

        let mut edge_max_move = 0.0_f64;
        let mut mid_max_move = 0.0_f64;
        let (mut edge_volume, mut edge_count) = (0.0_f64, 0usize);
        let (mut mid_volume, mut mid_count) = (0.0_f64, 0usize);
        for session in bars.chunks(config.bars_per_day) {
            for (slot, bar) in session.iter().enumerate() {
                let change = (bar.close / bar.open - 1.0).abs();
                if slot == 0 || slot + 1 == config.bars_per_day {
                    edge_max_move = edge_max_move.max(change);
                    edge_volume += bar.volume as f64;
                    edge_count += 1;
                } else {
                    mid_max_move = mid_max_move.max(change);
                    mid_volume += bar.volume as f64;
                    mid_count += 1;
                }
            }
        }

        assert!(mid_max_move <= config.volatility + 1e-12);
        assert!(edge_max_move > config.volatility, "edge max {}", edge_max_move);
        assert!(edge_max_move <= config.volatility * config.edge_multiplier + 1e-12);
        assert!(edge_volume / edge_count as f64 > 1.2 * (mid_volume / mid_count as f64));
        assert!(bars.iter().filter(|b| b.volume as f64 >= 1.5 * config.base_volume as f64).count() > 0);
    }
}

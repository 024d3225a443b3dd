//! CLI definition and dispatch.

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::console_report::ConsoleReport;
use crate::adapters::csv_source::CsvSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::synthetic_source::{GeneratorConfig, SyntheticSource};
use crate::domain::backtest::{BacktestEngine, EngineConfig};
use crate::domain::error::BacktestError;
use crate::domain::execution::CostModel;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::monte_carlo::run_monte_carlo;
use crate::domain::strategy::{RiskLimits, StrategyParams};
use crate::ports::bar_source::BarSource;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_MONTE_CARLO_RUNS: usize = 100;
const DEFAULT_MONTE_CARLO_WORKERS: usize = 4;
const TRADING_DAYS_PER_MONTH: usize = 21;

#[derive(Parser, Debug)]
#[command(name = "barsim", about = "Mean-reversion bar backtest simulator")]
pub struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Read bars from this CSV file instead of the configured source
        #[arg(long)]
        bars: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        days: Option<usize>,
    },
    /// Validate a configuration file and print the effective settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run repeated backtests over independently seeded synthetic data
    MonteCarlo {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        runs: Option<usize>,
        #[arg(long)]
        workers: Option<usize>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            bars,
            seed,
            days,
        } => run_backtest(&config, bars, seed, days),
        Command::Validate { config } => run_validate(&config),
        Command::MonteCarlo {
            config,
            runs,
            workers,
        } => run_monte_carlo_command(&config, runs, workers),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_backtest(
    config_path: &Path,
    bars_override: Option<PathBuf>,
    seed: Option<u64>,
    days: Option<usize>,
) -> Result<(), BacktestError> {
    let config = load_config(config_path)?;
    let engine = BacktestEngine::new(build_engine_config(&config)?)?;

    let source: Box<dyn BarSource> = match resolve_csv_path(&config, bars_override)? {
        Some(path) => {
            if seed.is_some() || days.is_some() {
                warn!("--seed and --days only apply to synthetic data, ignoring");
            }
            eprintln!("Reading bars from {}", path.display());
            Box::new(CsvSource::new(path))
        }
        None => {
            let mut generator = build_generator_config(&config)?;
            if let Some(seed) = seed {
                generator.seed = seed;
            }
            if let Some(days) = days {
                generator.days = days;
            }
            eprintln!(
                "Generating {} days of synthetic bars (seed {})",
                generator.days, generator.seed
            );
            Box::new(SyntheticSource::new(generator)?)
        }
    };

    let result = engine.run_source(source.as_ref())?;
    let metrics = BacktestMetrics::compute(&result);
    ConsoleReport.write(&result, &metrics)
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    let config = load_config(config_path)?;
    let engine = BacktestEngine::new(build_engine_config(&config)?)?;
    let c = engine.config();

    eprintln!("\n[backtest]");
    eprintln!("  initial_capital:        {}", c.initial_capital);
    eprintln!("  commission_rate:        {}", c.costs.commission_rate);
    eprintln!("  slippage_rate:          {}", c.costs.slippage_rate);
    eprintln!("  tax_rate:               {}", c.costs.tax_rate);
    eprintln!("  bars_per_month:         {}", c.bars_per_month);
    eprintln!("\n[strategy]");
    eprintln!("  indicator:              RSI({})", c.strategy.rsi_period);
    eprintln!("  oversold_threshold:     {}", c.strategy.oversold_threshold);
    eprintln!("  volume_floor:           {}", c.strategy.volume_floor);
    eprintln!("  max_hold_bars:          {}", c.strategy.max_hold_bars);
    eprintln!("  lot_size:               {}", c.strategy.lot_size);
    eprintln!(
        "  kelly:                  clamp(win_rate - {}, 0, {})",
        c.strategy.kelly_offset, c.strategy.kelly_cap
    );
    eprintln!("  default_win_rate:       {}", c.strategy.default_win_rate);
    eprintln!("\n[risk]");
    eprintln!("  max_consecutive_losses: {}", c.risk.max_consecutive_losses);
    eprintln!("  max_loss_fraction:      {}", c.risk.max_loss_fraction);

    eprintln!("\n[data]");
    match resolve_csv_path(&config, None)? {
        Some(path) => eprintln!("  source:                 csv ({})", path.display()),
        None => {
            let g = SyntheticSource::new(build_generator_config(&config)?)?;
            let g = g.config();
            eprintln!("  source:                 synthetic");
            eprintln!("  days:                   {}", g.days);
            eprintln!("  seed:                   {}", g.seed);
            eprintln!("  start_date:             {}", g.start_date);
            eprintln!("  start_price:            {}", g.start_price);
            eprintln!("  bars_per_day:           {}", g.bars_per_day);
        }
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_monte_carlo_command(
    config_path: &Path,
    runs: Option<usize>,
    workers: Option<usize>,
) -> Result<(), BacktestError> {
    let config = load_config(config_path)?;
    let engine = BacktestEngine::new(build_engine_config(&config)?)?;
    let source = SyntheticSource::new(build_generator_config(&config)?)?;

    let runs = match runs {
        Some(r) => r,
        None => get_count(&config, "monte_carlo", "runs", DEFAULT_MONTE_CARLO_RUNS)?,
    };
    let workers = match workers {
        Some(w) => w,
        None => get_count(&config, "monte_carlo", "workers", DEFAULT_MONTE_CARLO_WORKERS)?,
    };
    if workers < 1 {
        return Err(BacktestError::invalid(
            "monte_carlo",
            "workers",
            "workers must be at least 1",
        ));
    }

    let base_seed = source.config().seed;
    let summary = run_monte_carlo(&engine, runs, workers, |run| {
        source.with_seed(base_seed.wrapping_add(run as u64))
    })?;
    info!(runs, halted = summary.halted_runs, "monte carlo finished");
    ConsoleReport.write_monte_carlo(&summary)
}

/// Engine settings from `[backtest]`, `[strategy]` and `[risk]`.
///
/// Absent keys take their defaults. Without an explicit `bars_per_month`,
/// a month is 21 sessions of `[data] bars_per_day` bars.
pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, BacktestError> {
    let costs_default = CostModel::default();
    let strategy_default = StrategyParams::default();
    let risk_default = RiskLimits::default();

    let costs = CostModel {
        commission_rate: config.get_double(
            "backtest",
            "commission_rate",
            costs_default.commission_rate,
        )?,
        slippage_rate: config.get_double("backtest", "slippage_rate", costs_default.slippage_rate)?,
        tax_rate: config.get_double("backtest", "tax_rate", costs_default.tax_rate)?,
    };

    let strategy = StrategyParams {
        rsi_period: get_count(config, "strategy", "rsi_period", strategy_default.rsi_period)?,
        oversold_threshold: config.get_double(
            "strategy",
            "oversold_threshold",
            strategy_default.oversold_threshold,
        )?,
        volume_floor: config.get_int("strategy", "volume_floor", strategy_default.volume_floor)?,
        max_hold_bars: get_u32(config, "strategy", "max_hold_bars", strategy_default.max_hold_bars)?,
        lot_size: config.get_int("strategy", "lot_size", strategy_default.lot_size)?,
        kelly_offset: config.get_double("strategy", "kelly_offset", strategy_default.kelly_offset)?,
        kelly_cap: config.get_double("strategy", "kelly_cap", strategy_default.kelly_cap)?,
        default_win_rate: config.get_double(
            "strategy",
            "default_win_rate",
            strategy_default.default_win_rate,
        )?,
    };

    let risk = RiskLimits {
        max_consecutive_losses: get_u32(
            config,
            "risk",
            "max_consecutive_losses",
            risk_default.max_consecutive_losses,
        )?,
        max_loss_fraction: config.get_double(
            "risk",
            "max_loss_fraction",
            risk_default.max_loss_fraction,
        )?,
    };

    let bars_per_day = get_count(config, "data", "bars_per_day", 1)?;
    let bars_per_month = get_count(
        config,
        "backtest",
        "bars_per_month",
        TRADING_DAYS_PER_MONTH * bars_per_day.max(1),
    )?;

    Ok(EngineConfig {
        initial_capital: config.get_double(
            "backtest",
            "initial_capital",
            EngineConfig::default().initial_capital,
        )?,
        costs,
        strategy,
        risk,
        bars_per_month,
    })
}

/// Synthetic generator settings from `[data]`.
pub fn build_generator_config(config: &dyn ConfigPort) -> Result<GeneratorConfig, BacktestError> {
    let d = GeneratorConfig::default();

    let start_date = match config.get_string("data", "start_date") {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
            BacktestError::invalid("data", "start_date", format!("expected YYYY-MM-DD: {}", e))
        })?,
        None => d.start_date,
    };
    let session_open = match config.get_string("data", "session_open") {
        Some(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| {
            BacktestError::invalid("data", "session_open", format!("expected HH:MM: {}", e))
        })?,
        None => d.session_open,
    };
    let seed = config.get_int("data", "seed", d.seed as i64)?;
    let seed = u64::try_from(seed)
        .map_err(|_| BacktestError::invalid("data", "seed", "seed must be non-negative"))?;

    Ok(GeneratorConfig {
        start_date,
        days: get_count(config, "data", "days", d.days)?,
        start_price: config.get_double("data", "start_price", d.start_price)?,
        volatility: config.get_double("data", "volatility", d.volatility)?,
        edge_multiplier: config.get_double("data", "edge_multiplier", d.edge_multiplier)?,
        bars_per_day: get_count(config, "data", "bars_per_day", d.bars_per_day)?,
        bar_minutes: get_u32(config, "data", "bar_minutes", d.bar_minutes)?,
        session_open,
        base_volume: config.get_int("data", "base_volume", d.base_volume)?,
        seed,
    })
}

/// CSV path when bars come from a file: the `--bars` override, or
/// `[data] source = csv` with `csv_path`. `None` selects synthetic data.
pub fn resolve_csv_path(
    config: &dyn ConfigPort,
    bars_override: Option<PathBuf>,
) -> Result<Option<PathBuf>, BacktestError> {
    if let Some(path) = bars_override {
        return Ok(Some(path));
    }

    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "synthetic".to_string());

    match source.as_str() {
        "synthetic" => Ok(None),
        "csv" => config
            .get_string("data", "csv_path")
            .map(|p| Some(PathBuf::from(p.trim())))
            .ok_or_else(|| BacktestError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_path".to_string(),
            }),
        other => Err(BacktestError::invalid(
            "data",
            "source",
            format!("unknown source '{}', expected synthetic or csv", other),
        )),
    }
}

fn get_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, BacktestError> {
    let value = config.get_int(section, key, default as i64)?;
    usize::try_from(value)
        .map_err(|_| BacktestError::invalid(section, key, format!("{} must be non-negative", key)))
}

fn get_u32(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, BacktestError> {
    let value = config.get_int(section, key, i64::from(default))?;
    u32::try_from(value).map_err(|_| {
        BacktestError::invalid(section, key, format!("{} must be a non-negative 32-bit count", key))
    })
}

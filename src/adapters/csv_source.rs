//! CSV file bar source.
//!
//! Expects a header row followed by `timestamp,open,high,low,close,volume`.
//! Timestamps are `%Y-%m-%d %H:%M:%S` or a bare `%Y-%m-%d` (read as midnight).

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::bar_source::BarSource;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(content: &str) -> Result<Vec<Bar>, BacktestError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars: Vec<Bar> = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| BacktestError::data(format!("CSV parse error: {}", e)))?;
            let line = row + 2;

            let ts_str = field(&record, 0, "timestamp", line)?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
                BacktestError::data(format!("invalid timestamp '{}' on line {}", ts_str, line))
            })?;

            let bar = Bar {
                timestamp,
                open: number(&record, 1, "open", line)?,
                high: number(&record, 2, "high", line)?,
                low: number(&record, 3, "low", line)?,
                close: number(&record, 4, "close", line)?,
                volume: field(&record, 5, "volume", line)?
                    .parse()
                    .map_err(|e| {
                        BacktestError::data(format!("invalid volume on line {}: {}", line, e))
                    })?,
            };

            for (name, price) in [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
            ] {
                if !(price.is_finite() && price > 0.0) {
                    return Err(BacktestError::data(format!(
                        "{} must be a positive finite price on line {}, got {}",
                        name, line, price
                    )));
                }
            }
            if bar.volume <= 0 {
                return Err(BacktestError::data(format!(
                    "non-positive volume on line {}",
                    line
                )));
            }
            if let Some(prev) = bars.last() {
                if bar.timestamp <= prev.timestamp {
                    return Err(BacktestError::data(format!(
                        "timestamps not strictly increasing on line {}",
                        line
                    )));
                }
            }

            bars.push(bar);
        }

        Ok(bars)
    }
}

impl BarSource for CsvSource {
    fn load_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            BacktestError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let bars = Self::parse(&content)?;
        debug!(path = %self.path.display(), bars = bars.len(), "loaded csv bars");
        Ok(bars)
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn field<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    name: &str,
    line: usize,
) -> Result<&'a str, BacktestError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| BacktestError::data(format!("missing {} column on line {}", name, line)))
}

fn number(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    line: usize,
) -> Result<f64, BacktestError> {
    field(record, idx, name, line)?
        .parse()
        .map_err(|e| BacktestError::data(format!("invalid {} on line {}: {}", name, line, e)))
}

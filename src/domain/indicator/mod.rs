//! Technical indicator implementations.
//!
//! An [`IndicatorSeries`] is shorter than the bar series it was computed from:
//! `values[k]` belongs to bar `offset + k`. Bars before `offset` are warm-up.

pub mod rsi;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub offset: usize,
    pub values: Vec<f64>,
}

impl IndicatorSeries {
    /// Value aligned to bar `bar_index`, or `None` inside the warm-up window
    /// or past the end of the series.
    pub fn at_bar(&self, bar_index: usize) -> Option<f64> {
        bar_index
            .checked_sub(self.offset)
            .and_then(|k| self.values.get(k))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

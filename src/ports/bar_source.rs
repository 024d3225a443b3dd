//! Bar source port trait.
//!
//! Any source producing ordered, timestamped OHLCV bars with positive volume
//! can feed the engine: a synthetic generator, a CSV file, or a fixture.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;

pub trait BarSource {
    /// Load the full bar sequence in chronological order.
    fn load_bars(&self) -> Result<Vec<Bar>, BacktestError>;
}

impl BarSource for Vec<Bar> {
    fn load_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        Ok(self.clone())
    }
}

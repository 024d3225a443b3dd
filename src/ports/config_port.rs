//! Configuration access port trait.

use crate::domain::error::BacktestError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is absent; `ConfigInvalid` when it does not parse.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, BacktestError>;

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, BacktestError>;
}

//! Concrete adapter implementations for ports.

pub mod console_report;
pub mod csv_source;
pub mod file_config_adapter;
pub mod synthetic_source;

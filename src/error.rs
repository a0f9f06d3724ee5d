//! Errors raised at the crate's fallible boundaries (files, CSV, config, controls).
//!
//! Per-weapon data gaps are never errors; they surface as `None` metrics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unrecognized value {value:?} for control '{control}'")]
    InvalidControl { control: String, value: String },

    #[error("invalid weight '{name}': {value} (weights must be finite and non-negative)")]
    InvalidWeight { name: String, value: f64 },

    #[error("data validation error: {0}")]
    Validation(String),
}

impl BalanceError {
    pub fn invalid_control(control: &str, value: &str) -> Self {
        BalanceError::InvalidControl {
            control: control.to_string(),
            value: value.to_string(),
        }
    }
}

pub type BalanceResult<T> = Result<T, BalanceError>;

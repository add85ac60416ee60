//! Error types for period-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Invalid count: {0}")]
    InvalidCount(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid date input: {0}")]
    InvalidDateInput(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, PeriodError>;

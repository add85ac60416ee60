//! Error types for etl-structures operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Cannot convert '{key}' to {target}: {reason}")]
    Conversion {
        key: String,
        target: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StructureError>;

/// Short JSON kind name used in error messages and tree output.
pub(crate) fn kind_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

//! Error types for the resampler

use thiserror::Error;

/// Result type alias for resampling operations
pub type Result<T> = std::result::Result<T, SmognError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum SmognError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Clustering error: {0}")]
    Clustering(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Internal consistency violation: {0}")]
    Internal(String),
}

impl From<polars::error::PolarsError> for SmognError {
    fn from(err: polars::error::PolarsError) -> Self {
        SmognError::Data(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SmognError::Config("threshold out of range".to_string());
        assert_eq!(err.to_string(), "Configuration error: threshold out of range");
    }
}

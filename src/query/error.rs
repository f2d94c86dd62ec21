//! Query error types
//!
//! Defines all error conditions that can occur while resolving a query.

use crate::interval::DurationError;
use thiserror::Error;

/// Errors that can occur during query resolution
#[derive(Error, Debug)]
pub enum QueryError {
    /// Raw query payload does not decode into a query model
    #[error("Malformed query JSON: {0}")]
    MalformedQueryJson(#[from] serde_json::Error),

    /// Declared or configured interval is not a valid duration
    #[error("Invalid interval: {0}")]
    InvalidInterval(#[from] DurationError),

    /// Alignment was asked to divide by a zero step
    #[error("Step must be greater than zero")]
    NonPositiveStep,

    /// Aligned instant falls outside the representable range
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::NonPositiveStep;
        assert_eq!(err.to_string(), "Step must be greater than zero");

        let err: QueryError = DurationError::InvalidFormat("soon".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Invalid interval: Invalid duration format: 'soon'"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: QueryError = json_err.into();
        assert!(matches!(err, QueryError::MalformedQueryJson(_)));
    }
}

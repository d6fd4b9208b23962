//! Query error types
//!
//! Separates malformed input, which is rejected before anything runs, from
//! failures while executing against the store.

use thiserror::Error;

/// Errors that can occur while building or running a statistics query
#[derive(Error, Debug)]
pub enum QueryError {
    /// Interval token outside the supported duration grammar
    #[error("Invalid interval '{token}': {reason}")]
    InvalidInterval { token: String, reason: String },

    /// Query execution against the store failed
    #[error("Query execution failed: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

impl QueryError {
    /// Whether the error was caused by caller input rather than the store
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInterval { .. })
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_error_display() {
        let err = QueryError::InvalidInterval {
            token: "P1Q".to_string(),
            reason: "unsupported duration unit".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid interval 'P1Q': unsupported duration unit"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_error_is_not_client_error() {
        let err: QueryError = StorageError::Pool("timed out".to_string()).into();
        assert!(!err.is_client_error());
        assert!(err.to_string().starts_with("Query execution failed"));
    }
}

//! Storage error types
//!
//! Defines all errors that can occur while talking to the analytical store.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not obtain or use a pooled connection
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// The engine rejected or failed a statement
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A single-row query returned no row
    #[error("Query returned no rows")]
    EmptyResult,

    /// CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV record was readable but invalid
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: u64, message: String },
}

impl From<deadpool_sqlite::PoolError> for StorageError {
    fn from(err: deadpool_sqlite::PoolError) -> Self {
        StorageError::Pool(err.to_string())
    }
}

impl From<deadpool_sqlite::InteractError> for StorageError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        StorageError::Pool(format!("connection task failed: {}", err))
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::InvalidRecord {
            row: 3,
            message: "bad timestamp".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid record at row 3: bad timestamp");

        assert_eq!(StorageError::EmptyResult.to_string(), "Query returned no rows");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }

    #[test]
    fn test_sql_error_conversion() {
        let err: StorageError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StorageError::Sql(_)));
    }
}

//! Storage-specific error types for SQLite operations.
//!
//! These wrap Diesel and r2d2 errors and convert them to the
//! database-agnostic error types defined in `investar_core` before they
//! leave this crate.

use diesel::result::Error as DieselError;
use investar_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Errors internal to the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Schema management failed: {0}")]
    SchemaFailed(String),

    #[error("Value coercion failed: {0}")]
    Coercion(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::SchemaFailed(e) => Error::Database(DatabaseError::SchemaFailed(e)),
            StorageError::Coercion(e) => Error::Database(DatabaseError::Internal(e)),
        }
    }
}

/// Extension trait to convert Diesel and r2d2 errors to core errors.
///
/// `From<DieselError> for Error` is ruled out by orphan rules, so the
/// conversion goes through `StorageError`.
pub trait IntoCore {
    fn into_core(self) -> Error;
}

impl IntoCore for DieselError {
    fn into_core(self) -> Error {
        StorageError::QueryFailed(self).into()
    }
}

impl IntoCore for r2d2::Error {
    fn into_core(self) -> Error {
        StorageError::PoolError(self).into()
    }
}

impl IntoCore for diesel::ConnectionError {
    fn into_core(self) -> Error {
        StorageError::ConnectionFailed(self).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_database_not_found() {
        let err: Error = StorageError::QueryFailed(DieselError::NotFound).into();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_schema_failure_maps_to_schema_failed() {
        let err: Error = StorageError::SchemaFailed("drift".to_string()).into();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::SchemaFailed(_))
        ));
    }
}

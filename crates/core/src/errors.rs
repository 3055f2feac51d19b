//! Error types for the core domain.

use investar_market_data::MarketDataError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Database-agnostic storage failures, produced by the storage crate's
/// error conversion.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Pool creation failed: {0}")]
    PoolCreationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Schema management failed: {0}")]
    SchemaFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Top-level error type of the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A query matched no instrument, after any registered fallback.
    #[error("No instrument matches '{0}'")]
    CodeNotFound(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_not_found_display() {
        let err = Error::CodeNotFound("삼성".to_string());
        assert_eq!(format!("{}", err), "No instrument matches '삼성'");
    }

    #[test]
    fn test_market_data_error_converts() {
        let err: Error = MarketDataError::NoData.into();
        assert!(matches!(err, Error::MarketData(_)));
    }
}

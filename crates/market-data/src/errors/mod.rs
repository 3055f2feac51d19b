//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all provider operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching listings or price history.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines whether the
/// provider should retry the request before giving up.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The source returned zero rows for the requested window.
    /// The instrument exists but has no trading history there.
    /// This is a legitimate empty answer, not a failure.
    #[error("No data for requested window")]
    NoData,

    /// The page or payload structure did not match expectations.
    /// Retrying an unparseable structure will not help.
    #[error("Provider {provider} returned unexpected structure: {message}")]
    Parse {
        /// The provider whose response failed to parse
        provider: String,
        /// What was missing or malformed
        message: String,
    },

    /// The request to the provider timed out.
    /// Retried up to the provider's configured budget.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A non-success HTTP status or other provider-side failure.
    #[error("Provider error: {provider} - {message}")]
    Provider {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    /// Retried up to the provider's configured budget.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: the error is terminal for this request
    /// - [`RetryClass::Retry`]: transient, retry after a short delay
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::NoData | Self::Parse { .. } => RetryClass::Never,
            Self::Timeout { .. } | Self::Provider { .. } | Self::Network(_) => RetryClass::Retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_never_retries() {
        assert_eq!(MarketDataError::NoData.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_parse_error_never_retries() {
        let error = MarketDataError::Parse {
            provider: "NAVER".to_string(),
            message: "price table missing".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_timeout_retries() {
        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Retry);
    }

    #[test]
    fn test_provider_error_retries() {
        let error = MarketDataError::Provider {
            provider: "YAHOO".to_string(),
            message: "HTTP error: 503".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Retry);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::Parse {
            provider: "NAVER".to_string(),
            message: "no item elements".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider NAVER returned unexpected structure: no item elements"
        );

        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(format!("{}", error), "Timeout: YAHOO");
    }
}

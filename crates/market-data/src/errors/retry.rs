/// Classifies an error by whether retrying the request can help.
///
/// Providers consult this after a failed request: transient transport
/// failures are retried within the provider's budget, while structural
/// failures (an unparseable page, a legitimately empty answer) terminate
/// the request immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Terminal for this request. Retrying yields the same outcome.
    Never,
    /// Transient. Retry after a short delay, up to the provider's budget.
    Retry,
}

impl RetryClass {
    /// Returns true if the error should be retried.
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryClass::Retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry() {
        assert!(RetryClass::Retry.should_retry());
        assert!(!RetryClass::Never.should_retry());
    }
}

//! Daily price providers.
//!
//! Each provider adapts one upstream source to the [`PriceProvider`]
//! contract: pagination, per-source retry policy, and symbol-variant
//! fallback are internal concerns of the adapter; callers see a
//! normalized ascending series of [`DailyBar`]s.

pub mod naver;
pub mod yahoo;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{DailyBar, FetchWindow};

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// A source of daily OHLCV history for one country's instruments.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Stable identifier used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Fetches the daily history for `code` over the requested window.
    ///
    /// The result is ascending by date and never extends past the
    /// provider's configured cutoff. An exhausted retry budget on a
    /// transport failure yields `Ok(vec![])` so a flaky source degrades
    /// to "no update this cycle" instead of failing the whole pass;
    /// a structurally unexpected response is a
    /// [`MarketDataError::Parse`] and is surfaced to the caller.
    async fn fetch_daily_history(
        &self,
        code: &str,
        window: FetchWindow,
    ) -> Result<Vec<DailyBar>, MarketDataError>;
}

/// Transport seam between a provider and its upstream: one URL in, the
/// response body out. Providers own the retry policy on top of it.
#[async_trait]
pub(crate) trait BodyFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, MarketDataError>;
}

pub(crate) struct HttpBodyFetcher {
    client: reqwest::Client,
    provider: &'static str,
}

impl HttpBodyFetcher {
    pub(crate) fn new(provider: &'static str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        HttpBodyFetcher { client, provider }
    }
}

#[async_trait]
impl BodyFetcher for HttpBodyFetcher {
    async fn get(&self, url: &str) -> Result<String, MarketDataError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::Provider {
                provider: self.provider.to_string(),
                message: format!("HTTP error: {}", response.status()),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Fetcher that replays a scripted sequence of responses and keeps
    /// failing with a transient error once the script runs out.
    pub(crate) struct ScriptedFetcher {
        responses: Mutex<VecDeque<Result<String, MarketDataError>>>,
        pub(crate) calls: AtomicUsize,
        pub(crate) urls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn new(responses: Vec<Result<String, MarketDataError>>) -> Self {
            ScriptedFetcher {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BodyFetcher for ScriptedFetcher {
        async fn get(&self, url: &str) -> Result<String, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(transient()))
        }
    }

    /// A retryable failure, as an unreachable upstream would produce.
    pub(crate) fn transient() -> MarketDataError {
        MarketDataError::Provider {
            provider: "TEST".to_string(),
            message: "HTTP error: 503".to_string(),
        }
    }
}

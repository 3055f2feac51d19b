//! Yahoo Finance chart-API provider for US instruments.
//!
//! One date-bounded JSON request per instrument. Transient failures are
//! retried a fixed number of times; when the primary symbol yields
//! nothing and contains a dot, the dashed variant is tried once before
//! giving up (class shares are listed as `BRK.B` in index tables but
//! `BRK-B` on Yahoo).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{DailyBar, FetchWindow};
use crate::provider::{BodyFetcher, HttpBodyFetcher, PriceProvider};

const PROVIDER_ID: &str = "YAHOO";
const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Tunables for the Yahoo chart provider.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Oldest date a full backfill reaches back to.
    pub cutoff: NaiveDate,
    /// Calendar days covered by a routine refresh.
    pub recent_days: i64,
    /// Attempts per request before the request is given up.
    pub retry_budget: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        YahooConfig {
            cutoff: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            recent_days: 20,
            retry_budget: 3,
            retry_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct YahooDailyProvider {
    fetcher: Arc<dyn BodyFetcher>,
    config: YahooConfig,
}

impl YahooDailyProvider {
    pub fn new(config: YahooConfig) -> Self {
        let fetcher = Arc::new(HttpBodyFetcher::new(PROVIDER_ID, config.timeout));
        YahooDailyProvider { fetcher, config }
    }

    fn window_bounds(&self, window: FetchWindow) -> (i64, i64) {
        let today = Utc::now().date_naive();
        let start = match window {
            FetchWindow::Recent => today - ChronoDuration::days(self.config.recent_days),
            FetchWindow::Full => self.config.cutoff,
        };
        let end = today + ChronoDuration::days(1);
        (
            start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0),
            end.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or(0),
        )
    }

    /// Fetches and parses the chart for one symbol, retrying transient
    /// failures within the budget. `Ok(vec![])` after the budget is
    /// exhausted, so a flaky upstream degrades instead of failing.
    async fn fetch_symbol(
        &self,
        symbol: &str,
        window: FetchWindow,
    ) -> Result<Vec<DailyBar>, MarketDataError> {
        let (period1, period2) = self.window_bounds(window);
        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=div%7Csplit",
            BASE_URL, symbol, period1, period2
        );
        for attempt in 1..=self.config.retry_budget {
            match self.request_chart(&url).await {
                Ok(response) => return parse_chart(symbol, response),
                Err(e) if e.retry_class().should_retry() => {
                    debug!(
                        "Yahoo fetch failed for {} (attempt {}/{}): {}",
                        symbol, attempt, self.config.retry_budget, e
                    );
                    if attempt < self.config.retry_budget {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        warn!("Giving up on Yahoo history for {}", symbol);
        Ok(Vec::new())
    }

    async fn request_chart(&self, url: &str) -> Result<ChartResponse, MarketDataError> {
        let body = self.fetcher.get(url).await?;
        serde_json::from_str::<ChartResponse>(&body).map_err(|e| MarketDataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: format!("invalid chart payload: {}", e),
        })
    }
}

#[async_trait]
impl PriceProvider for YahooDailyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_daily_history(
        &self,
        code: &str,
        window: FetchWindow,
    ) -> Result<Vec<DailyBar>, MarketDataError> {
        let bars = self.fetch_symbol(code, window).await?;
        if !bars.is_empty() || !code.contains('.') {
            return Ok(bars);
        }
        // Dot symbols are dashed on Yahoo; try the variant once.
        let variant = code.replace('.', "-");
        debug!("Retrying {} as {}", code, variant);
        self.fetch_symbol(&variant, window).await
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
    adjclose: Option<Vec<AdjCloseBlock>>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Flattens a chart payload into bars. Rows with a null timestamp slot
/// or an unrepresentable price are skipped with a warning.
fn parse_chart(symbol: &str, response: ChartResponse) -> Result<Vec<DailyBar>, MarketDataError> {
    if let Some(error) = response.chart.error {
        // "Not Found" for the symbol is an empty answer, not a fault.
        if error.code == "Not Found" {
            return Ok(Vec::new());
        }
        return Err(MarketDataError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: format!("{}: {}", error.code, error.description),
        });
    }
    let Some(result) = response.chart.result.and_then(|mut r| {
        if r.is_empty() {
            None
        } else {
            Some(r.remove(0))
        }
    }) else {
        return Ok(Vec::new());
    };
    let timestamps = result.timestamp.unwrap_or_default();
    if timestamps.is_empty() {
        return Ok(Vec::new());
    }
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .and_then(|mut blocks| {
            if blocks.is_empty() {
                None
            } else {
                blocks.remove(0).adjclose
            }
        })
        .unwrap_or_default();

    let at = |series: &Option<Vec<Option<f64>>>, i: usize| -> Option<f64> {
        series.as_ref().and_then(|v| v.get(i).copied().flatten())
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let open = at(&quote.open, i);
        let high = at(&quote.high, i);
        let low = at(&quote.low, i);
        // Adjusted close when present, raw close otherwise.
        let close = adjclose
            .get(i)
            .copied()
            .flatten()
            .or_else(|| at(&quote.close, i));
        let volume = at(&quote.volume, i);

        let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
            continue;
        };
        let converted = (
            Decimal::from_f64_retain(open),
            Decimal::from_f64_retain(high),
            Decimal::from_f64_retain(low),
            Decimal::from_f64_retain(close),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = converted else {
            warn!("Skipping {} bar at {}: unrepresentable price", symbol, date);
            continue;
        };
        bars.push(DailyBar {
            date,
            open,
            high,
            low,
            close,
            diff: None,
            volume: volume.map(round_volume).unwrap_or(0),
        });
    }
    bars.sort_by_key(|bar| bar.date);
    bars.dedup_by_key(|bar| bar.date);
    Ok(bars)
}

/// The chart payload reports volume as a float; round to the nearest
/// share instead of truncating. Non-finite values become zero, as the
/// saturating cast would make them extreme counts otherwise.
fn round_volume(v: f64) -> i64 {
    if v.is_finite() {
        v.round() as i64
    } else {
        0
    }
}

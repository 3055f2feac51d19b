//! Naver Finance daily-quote provider for Korean instruments.
//!
//! The source is a paginated HTML table (`item/sise_day.nhn`), newest
//! rows first, 10 rows per page. The provider walks pages until one
//! comes back empty or its oldest row crosses the configured cutoff
//! date, retrying each page a fixed number of times on transport
//! failures. HTML parsing is kept in pure functions so the table layout
//! can be exercised with fixtures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, warn};
use scraper::{Html, Selector};

use crate::errors::MarketDataError;
use crate::models::{DailyBar, FetchWindow};
use crate::parse;
use crate::provider::{BodyFetcher, HttpBodyFetcher, PriceProvider};

const PROVIDER_ID: &str = "NAVER";
const BASE_URL: &str = "https://finance.naver.com/item/sise_day.nhn";

lazy_static! {
    static ref ROW_SELECTOR: Selector = Selector::parse("table.type2 tr").unwrap();
    static ref CELL_SELECTOR: Selector = Selector::parse("td").unwrap();
}

/// Tunables for the Naver daily provider.
#[derive(Debug, Clone)]
pub struct NaverConfig {
    /// Oldest date worth keeping; rows before it are discarded and
    /// pagination stops once a page reaches past it.
    pub cutoff: NaiveDate,
    /// Pages fetched for a routine refresh (about 20 trading days).
    pub recent_pages: u32,
    /// Page ceiling for a full backfill.
    pub full_pages: u32,
    /// Attempts per page before the page is given up.
    pub retry_budget: u32,
    /// Delay between attempts on the same page.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for NaverConfig {
    fn default() -> Self {
        NaverConfig {
            cutoff: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            recent_pages: 2,
            full_pages: 500,
            retry_budget: 3,
            retry_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct NaverDailyProvider {
    fetcher: Arc<dyn BodyFetcher>,
    config: NaverConfig,
}

impl NaverDailyProvider {
    pub fn new(config: NaverConfig) -> Self {
        let fetcher = Arc::new(HttpBodyFetcher::new(PROVIDER_ID, config.timeout));
        NaverDailyProvider { fetcher, config }
    }

    fn page_url(&self, code: &str, page: u32) -> String {
        format!("{}?code={}&page={}", BASE_URL, code, page)
    }

    /// Fetches one page's HTML, retrying transient failures within the
    /// budget. `Ok(None)` means the budget was exhausted; the caller
    /// degrades to whatever rows it already has.
    async fn fetch_page(&self, code: &str, page: u32) -> Result<Option<String>, MarketDataError> {
        let url = self.page_url(code, page);
        let mut last_error = None;
        for attempt in 1..=self.config.retry_budget {
            match self.fetcher.get(&url).await {
                Ok(body) => return Ok(Some(body)),
                Err(e) if e.retry_class().should_retry() => {
                    debug!(
                        "Naver page fetch failed for {} page {} (attempt {}/{}): {}",
                        code, page, attempt, self.config.retry_budget, e
                    );
                    last_error = Some(e);
                    if attempt < self.config.retry_budget {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(e) = last_error {
            warn!("Giving up on Naver page {} for {}: {}", page, code, e);
        }
        Ok(None)
    }
}

#[async_trait]
impl PriceProvider for NaverDailyProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_daily_history(
        &self,
        code: &str,
        window: FetchWindow,
    ) -> Result<Vec<DailyBar>, MarketDataError> {
        let max_pages = match window {
            FetchWindow::Recent => self.config.recent_pages,
            FetchWindow::Full => self.config.full_pages,
        };
        let mut bars: Vec<DailyBar> = Vec::new();

        for page in 1..=max_pages {
            let Some(body) = self.fetch_page(code, page).await? else {
                break;
            };
            // Parse before the next await: scraper documents are not Send.
            let page_bars = match parse_daily_page(&body) {
                Ok(page_bars) => page_bars,
                // A first page that does not parse is a real structural
                // failure; a later page losing its shape degrades to
                // the history gathered so far.
                Err(e) if page > 1 => {
                    warn!("Naver page {} for {} stopped parsing: {}", page, code, e);
                    break;
                }
                Err(e) => return Err(e),
            };
            if page_bars.is_empty() {
                break;
            }
            let crossed_cutoff = page_bars
                .iter()
                .any(|bar| bar.date < self.config.cutoff);
            bars.extend(
                page_bars
                    .into_iter()
                    .filter(|bar| bar.date >= self.config.cutoff),
            );
            if crossed_cutoff {
                break;
            }
        }

        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by_key(|bar| bar.date);
        debug!("Naver returned {} bars for {}", bars.len(), code);
        Ok(bars)
    }
}

/// Parses one daily-quote page into bars, newest first as rendered.
/// Rows missing cells or failing numeric normalization are dropped.
fn parse_daily_page(html: &str) -> Result<Vec<DailyBar>, MarketDataError> {
    let document = Html::parse_document(html);
    let mut saw_table = false;
    let mut bars = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        saw_table = true;
        let cells: Vec<String> = row
            .select(&CELL_SELECTOR)
            .map(|cell| cell.text().collect::<String>())
            .collect();
        // Header and spacer rows have fewer than the 7 data cells.
        if cells.len() < 7 {
            continue;
        }
        if let Some(bar) = parse_row(&cells) {
            bars.push(bar);
        }
    }

    if !saw_table {
        return Err(MarketDataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: "daily price table missing".to_string(),
        });
    }
    Ok(bars)
}

fn parse_row(cells: &[String]) -> Option<DailyBar> {
    let date = parse::parse_dotted_date(&cells[0])?;
    let close = parse::parse_decimal(&cells[1])?;
    let diff = parse::parse_signed_change(&cells[2]);
    let open = parse::parse_decimal(&cells[3])?;
    let high = parse::parse_decimal(&cells[4])?;
    let low = parse::parse_decimal(&cells[5])?;
    let volume = parse::parse_volume(&cells[6])?;
    Some(DailyBar {
        date,
        open,
        high,
        low,
        close,
        diff,
        volume,
    })
}

//! Slickcharts S&P 500 constituents scraper: the US listing universe.
//!
//! Company names on the page carry legal suffixes with trailing
//! periods, and class-share symbols use dots; both are normalized so
//! lookups and downstream Yahoo fetches see consistent identifiers.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::debug;
use scraper::{Html, Selector};

use crate::errors::MarketDataError;
use crate::listing::ListingProvider;
use crate::models::{Country, ListingRow};

const PROVIDER_ID: &str = "SLICKCHARTS";
const URL: &str = "https://www.slickcharts.com/sp500";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const MARKET: &str = "S&P500";

lazy_static! {
    static ref ROW_SELECTOR: Selector = Selector::parse("table.table tbody tr").unwrap();
    static ref CELL_SELECTOR: Selector = Selector::parse("td").unwrap();
}

pub struct SlickchartsListingProvider {
    client: reqwest::Client,
}

impl SlickchartsListingProvider {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        SlickchartsListingProvider { client }
    }
}

impl Default for SlickchartsListingProvider {
    fn default() -> Self {
        SlickchartsListingProvider::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl ListingProvider for SlickchartsListingProvider {
    fn country(&self) -> Country {
        Country::Us
    }

    async fn fetch_listing(&self) -> Result<Vec<ListingRow>, MarketDataError> {
        let response = self.client.get(URL).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP error: {}", response.status()),
            });
        }
        let body = response.text().await?;
        let rows = parse_constituents_page(&body)?;
        debug!("Slickcharts listing: {} rows", rows.len());
        Ok(rows)
    }
}

/// Parses the constituents table: rank, company, symbol, weight, ...
fn parse_constituents_page(html: &str) -> Result<Vec<ListingRow>, MarketDataError> {
    let document = Html::parse_document(html);
    let mut saw_table = false;
    let mut rows = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        saw_table = true;
        let cells: Vec<String> = row
            .select(&CELL_SELECTOR)
            .map(|cell| cell.text().collect::<String>())
            .collect();
        if cells.len() < 3 {
            continue;
        }
        let company = clean_company_name(&cells[1]);
        let code = normalize_symbol(&cells[2]);
        if company.is_empty() || code.is_empty() {
            continue;
        }
        rows.push(ListingRow {
            code,
            company,
            market: Some(MARKET.to_string()),
            marketcap: None,
            change_pct: None,
            sector: None,
        });
    }

    if !saw_table {
        return Err(MarketDataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: "constituents table missing".to_string(),
        });
    }
    Ok(rows)
}

/// Drops the trailing period from legal suffixes so "Apple Inc." and
/// "Apple Inc" resolve to the same company.
fn clean_company_name(raw: &str) -> String {
    let name = raw.trim();
    for suffix in ["Inc.", "Co.", "Corp.", "Ltd."] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return format!("{}{}", stem, suffix.trim_end_matches('.'));
        }
    }
    name.to_string()
}

/// Class-share dots become dashes, matching the price provider's
/// symbol convention.
fn normalize_symbol(raw: &str) -> String {
    raw.trim().replace('.', "-")
}

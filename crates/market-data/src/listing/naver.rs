//! Naver Finance market-cap ranking scraper: the Korean listing
//! universe (KOSPI and KOSDAQ), with market cap and daily change
//! parsed opportunistically from the ranking table.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::debug;
use scraper::{Html, Selector};

use crate::errors::MarketDataError;
use crate::listing::ListingProvider;
use crate::models::{Country, ListingRow};
use crate::parse;

const PROVIDER_ID: &str = "NAVER_LISTING";
const BASE_URL: &str = "https://finance.naver.com/sise/sise_market_sum.nhn";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

lazy_static! {
    static ref ROW_SELECTOR: Selector = Selector::parse("table.type_2 tr").unwrap();
    static ref CELL_SELECTOR: Selector = Selector::parse("td").unwrap();
    static ref LINK_SELECTOR: Selector = Selector::parse("a").unwrap();
}

/// One market segment of the ranking pages.
#[derive(Debug, Clone, Copy)]
struct Segment {
    /// `sosok` query parameter (0 = KOSPI, 1 = KOSDAQ).
    sosok: u32,
    label: &'static str,
    pages: u32,
}

/// Page counts cover the universe the engine tracks, not the whole
/// exchange (top rows by market cap).
const SEGMENTS: [Segment; 2] = [
    Segment {
        sosok: 0,
        label: "KOSPI",
        pages: 7,
    },
    Segment {
        sosok: 1,
        label: "KOSDAQ",
        pages: 3,
    },
];

pub struct NaverListingProvider {
    client: reqwest::Client,
}

impl NaverListingProvider {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        NaverListingProvider { client }
    }

    async fn fetch_page(&self, sosok: u32, page: u32) -> Result<String, MarketDataError> {
        let url = format!("{}?sosok={}&page={}", BASE_URL, sosok, page);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP error: {}", response.status()),
            });
        }
        Ok(response.text().await?)
    }
}

impl Default for NaverListingProvider {
    fn default() -> Self {
        NaverListingProvider::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl ListingProvider for NaverListingProvider {
    fn country(&self) -> Country {
        Country::Kr
    }

    async fn fetch_listing(&self) -> Result<Vec<ListingRow>, MarketDataError> {
        let mut rows = Vec::new();
        for segment in SEGMENTS {
            for page in 1..=segment.pages {
                let body = self.fetch_page(segment.sosok, page).await?;
                let page_rows = parse_ranking_page(&body, segment.label)?;
                rows.extend(page_rows);
            }
            debug!("Naver listing: {} rows after {}", rows.len(), segment.label);
        }
        Ok(rows)
    }
}

/// Parses one ranking page. Data rows carry a link to the instrument
/// page; the 6-digit code is the tail of its href.
fn parse_ranking_page(html: &str, market: &str) -> Result<Vec<ListingRow>, MarketDataError> {
    let document = Html::parse_document(html);
    let mut saw_table = false;
    let mut rows = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        saw_table = true;
        let cells: Vec<_> = row.select(&CELL_SELECTOR).collect();
        // Data rows have the full ranking column set.
        if cells.len() < 7 {
            continue;
        }
        let Some(link) = cells[1].select(&LINK_SELECTOR).next() else {
            continue;
        };
        let Some(code) = link.value().attr("href").and_then(code_from_href) else {
            continue;
        };
        let company = link.text().collect::<String>().trim().to_string();
        if company.is_empty() {
            continue;
        }
        let change_pct = parse::parse_percent(&cells[4].text().collect::<String>());
        let marketcap = parse::parse_decimal(&cells[6].text().collect::<String>());
        rows.push(ListingRow {
            code,
            company,
            market: Some(market.to_string()),
            marketcap,
            change_pct,
            sector: None,
        });
    }

    if !saw_table {
        return Err(MarketDataError::Parse {
            provider: PROVIDER_ID.to_string(),
            message: "ranking table missing".to_string(),
        });
    }
    Ok(rows)
}

/// The ranking table links at `/item/main.naver?code=XXXXXX`; the code
/// is the 6-character tail.
fn code_from_href(href: &str) -> Option<String> {
    let code = href.rsplit("code=").next()?;
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(code.to_string())
    } else {
        None
    }
}

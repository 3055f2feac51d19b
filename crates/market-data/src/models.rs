//! Normalized data types shared by every provider adapter.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Countries whose markets this engine tracks. Determines which listing
/// and price providers serve an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    /// Korea (KOSPI / KOSDAQ)
    Kr,
    /// United States (S&P 500 universe)
    Us,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Kr => "kr",
            Country::Us => "us",
        }
    }

    /// All supported countries, in sync order.
    pub fn all() -> [Country; 2] {
        [Country::Kr, Country::Us]
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kr" => Ok(Country::Kr),
            "us" => Ok(Country::Us),
            other => Err(format!("Unknown country: {}", other)),
        }
    }
}

/// How much history a price fetch should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchWindow {
    /// Routine refresh: the most recent handful of trading days.
    Recent,
    /// Backfill: everything back to the configured cutoff date.
    Full,
}

/// One normalized daily OHLCV bar as returned by a price provider.
///
/// `diff` is the day-over-day close change when the source reports it
/// directly (the Korean quote pages do); providers that do not report it
/// leave it `None` and the writer derives it from consecutive closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub diff: Option<Decimal>,
    pub volume: i64,
}

/// One row of a listing universe as returned by a listing provider.
///
/// `code` and `company` are always present; the enrichment fields are
/// parsed opportunistically from the source page and may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRow {
    /// Instrument identifier (6-digit Korean code or US ticker).
    pub code: String,
    /// Display name of the company.
    pub company: String,
    /// Market segment label ("KOSPI", "KOSDAQ", "S&P500").
    pub market: Option<String>,
    /// Market capitalization, in the source page's unit.
    pub marketcap: Option<Decimal>,
    /// Day-over-day change percentage.
    pub change_pct: Option<Decimal>,
    /// Sector label, when the source page carries one.
    pub sector: Option<String>,
}

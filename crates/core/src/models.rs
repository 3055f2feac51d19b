//! Domain models: instruments and cached price bars.

use chrono::NaiveDate;
use investar_market_data::Country;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One instrument of the cached universe.
///
/// `country` is stored as text so rows written before the tag existed
/// survive; [`country_tag`](Self::country_tag) resolves it for
/// provider dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub code: String,
    pub company: String,
    pub market: Option<String>,
    pub country: String,
    /// Day the listing refresh last touched this row.
    pub last_update: NaiveDate,
    pub marketcap: Option<Decimal>,
    pub change_pct: Option<Decimal>,
    pub sector: Option<String>,
}

impl Instrument {
    /// Country used for provider dispatch. An unrecognized tag falls
    /// back to the identifier shape: 6-character numeric codes are
    /// Korean, shorter tickers are US.
    pub fn country_tag(&self) -> Country {
        self.country.parse().unwrap_or_else(|_| {
            if self.code.len() >= 6 {
                Country::Kr
            } else {
                Country::Us
            }
        })
    }
}

/// One cached daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Day-over-day close change.
    pub diff: Decimal,
    pub volume: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(code: &str, country: &str) -> Instrument {
        Instrument {
            code: code.to_string(),
            company: "Test".to_string(),
            market: None,
            country: country.to_string(),
            last_update: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            marketcap: None,
            change_pct: None,
            sector: None,
        }
    }

    #[test]
    fn test_country_tag_from_explicit_value() {
        assert_eq!(instrument("005930", "kr").country_tag(), Country::Kr);
        assert_eq!(instrument("AAPL", "us").country_tag(), Country::Us);
    }

    #[test]
    fn test_country_tag_falls_back_to_code_shape() {
        assert_eq!(instrument("005930", "").country_tag(), Country::Kr);
        assert_eq!(instrument("AAPL", "unknown").country_tag(), Country::Us);
    }
}

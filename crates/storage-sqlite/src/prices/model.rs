//! Database model for daily price bars.

use chrono::NaiveDate;
use diesel::prelude::*;
use investar_core::models::PriceBar;
use investar_market_data::DailyBar;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::instruments::model::DATE_FORMAT;

#[derive(
    Queryable,
    QueryableByName,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
)]
#[diesel(table_name = crate::schema::daily_prices)]
#[diesel(primary_key(code, date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceBarDB {
    pub code: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub diff: f64,
    pub volume: i64,
}

impl PriceBarDB {
    /// Converts one provider bar to its storage row. Any price that
    /// cannot be represented fails the conversion, which aborts the
    /// whole batch upstream.
    pub fn from_bar(code: &str, bar: &DailyBar, diff: Decimal) -> Result<Self, StorageError> {
        let coerce = |label: &str, value: Decimal| -> Result<f64, StorageError> {
            value.to_f64().ok_or_else(|| {
                StorageError::Coercion(format!("{} {} for {}", label, value, code))
            })
        };
        Ok(PriceBarDB {
            code: code.to_string(),
            date: bar.date.format(DATE_FORMAT).to_string(),
            open: coerce("open", bar.open)?,
            high: coerce("high", bar.high)?,
            low: coerce("low", bar.low)?,
            close: coerce("close", bar.close)?,
            diff: coerce("diff", diff)?,
            volume: bar.volume,
        })
    }
}

impl TryFrom<PriceBarDB> for PriceBar {
    type Error = StorageError;

    fn try_from(db: PriceBarDB) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&db.date, DATE_FORMAT)
            .map_err(|e| StorageError::Coercion(format!("date '{}': {}", db.date, e)))?;
        let decimal = |label: &str, value: f64| -> Result<Decimal, StorageError> {
            Decimal::from_f64_retain(value)
                .ok_or_else(|| StorageError::Coercion(format!("{} {}", label, value)))
        };
        Ok(PriceBar {
            code: db.code,
            date,
            open: decimal("open", db.open)?,
            high: decimal("high", db.high)?,
            low: decimal("low", db.low)?,
            close: decimal("close", db.close)?,
            diff: decimal("diff", db.diff)?,
            volume: db.volume,
        })
    }
}

/// Fills in missing `diff` values as close-to-close deltas over an
/// ascending series. A bar that carries its own diff keeps it; the
/// first bar of a series without one gets zero.
pub fn derive_diffs(bars: &[DailyBar]) -> Vec<Decimal> {
    let mut diffs = Vec::with_capacity(bars.len());
    let mut prev_close: Option<Decimal> = None;
    for bar in bars {
        let derived = match (bar.diff, prev_close) {
            (Some(diff), _) => diff,
            (None, Some(prev)) => bar.close - prev,
            (None, None) => Decimal::ZERO,
        };
        diffs.push(derived);
        prev_close = Some(bar.close);
    }
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(date: (i32, u32, u32), close: Decimal, diff: Option<Decimal>) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            diff,
            volume: 100,
        }
    }

    #[test]
    fn test_derive_diffs_close_to_close() {
        let bars = vec![
            bar((2024, 3, 13), dec!(100), None),
            bar((2024, 3, 14), dec!(103), None),
            bar((2024, 3, 15), dec!(101), None),
        ];
        assert_eq!(derive_diffs(&bars), vec![dec!(0), dec!(3), dec!(-2)]);
    }

    #[test]
    fn test_derive_diffs_keeps_provider_values() {
        let bars = vec![
            bar((2024, 3, 14), dec!(100), Some(dec!(5))),
            bar((2024, 3, 15), dec!(103), None),
        ];
        assert_eq!(derive_diffs(&bars), vec![dec!(5), dec!(3)]);
    }

    #[test]
    fn test_storage_round_trip() {
        let source = bar((2024, 3, 15), dec!(72800), Some(dec!(1200)));
        let db = PriceBarDB::from_bar("005930", &source, dec!(1200)).unwrap();
        assert_eq!(db.date, "2024-03-15");

        let domain = PriceBar::try_from(db).unwrap();
        assert_eq!(domain.close, dec!(72800));
        assert_eq!(domain.diff, dec!(1200));
    }
}

//! Price repository: batch upserts of daily bars and range reads.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;

use investar_core::errors::Error;
use investar_core::models::PriceBar;
use investar_core::store::PriceStore;
use investar_core::Result;
use investar_market_data::DailyBar;
use rust_decimal::Decimal;

use super::model::{derive_diffs, PriceBarDB};
use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::instruments::model::DATE_FORMAT;
use crate::schema::daily_prices::dsl as daily_prices_dsl;
use crate::utils::chunk_for_sqlite;

pub struct PriceRepository {
    pool: Arc<DbPool>,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceStore for PriceRepository {
    /// Writes one instrument's bars, keyed `(code, date)` so re-running
    /// a day replaces rather than duplicates. Missing `diff` values are
    /// derived close-to-close before the write; a bar that cannot be
    /// coerced aborts the whole batch.
    async fn upsert_bars(&self, code: &str, bars: &[DailyBar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }
        let diffs = derive_diffs(bars);
        let db_rows: Vec<PriceBarDB> = bars
            .iter()
            .zip(diffs)
            .map(|(bar, diff)| PriceBarDB::from_bar(code, bar, diff))
            .collect::<std::result::Result<_, _>>()?;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn = get_connection(&pool)?;
            let mut total = 0;
            for chunk in chunk_for_sqlite(&db_rows) {
                total += diesel::replace_into(daily_prices_dsl::daily_prices)
                    .values(chunk)
                    .execute(&mut conn)
                    .map_err(|e| e.into_core())?;
            }
            Ok(total)
        })
        .await
        .map_err(|e| Error::Unexpected(e.to_string()))?
    }

    /// Bars for `code` within `[start, end]`, ascending by date. An
    /// unknown code or empty window is an empty vector.
    fn range(&self, code: &str, start: Option<NaiveDate>, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = daily_prices_dsl::daily_prices
            .filter(daily_prices_dsl::code.eq(code))
            .filter(daily_prices_dsl::date.le(end.format(DATE_FORMAT).to_string()))
            .order(daily_prices_dsl::date.asc())
            .into_boxed();
        if let Some(start) = start {
            query = query.filter(daily_prices_dsl::date.ge(start.format(DATE_FORMAT).to_string()));
        }
        let rows: Vec<PriceBarDB> = query.load(&mut conn).map_err(|e| e.into_core())?;
        rows.into_iter()
            .map(|db| PriceBar::try_from(db).map_err(Error::from))
            .collect()
    }

    fn latest_close(&self, code: &str) -> Result<Option<(NaiveDate, Decimal)>> {
        let mut conn = get_connection(&self.pool)?;
        let row: Option<PriceBarDB> = daily_prices_dsl::daily_prices
            .filter(daily_prices_dsl::code.eq(code))
            .order(daily_prices_dsl::date.desc())
            .first(&mut conn)
            .optional()
            .map_err(|e| e.into_core())?;
        match row {
            Some(db) => {
                let bar = PriceBar::try_from(db)?;
                Ok(Some((bar.date, bar.close)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use rust_decimal_macros::dec;

    fn bar(date: (i32, u32, u32), close: Decimal) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            open: close - dec!(1),
            high: close + dec!(1),
            low: close - dec!(2),
            close,
            diff: None,
            volume: 1000,
        }
    }

    fn temp_repo() -> (tempfile::TempDir, PriceRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.db");
        let pool = Arc::new(create_pool(path.to_str().unwrap()).unwrap());
        (dir, PriceRepository::new(pool))
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_day() {
        let (_dir, repo) = temp_repo();
        let bars = vec![bar((2024, 3, 14), dec!(100)), bar((2024, 3, 15), dec!(103))];

        repo.upsert_bars("005930", &bars).await.unwrap();
        repo.upsert_bars("005930", &bars).await.unwrap();

        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let stored = repo.range("005930", None, end).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].diff, dec!(0));
        assert_eq!(stored[1].diff, dec!(3));
    }

    #[tokio::test]
    async fn test_replace_updates_existing_day() {
        let (_dir, repo) = temp_repo();
        repo.upsert_bars("005930", &[bar((2024, 3, 15), dec!(100))])
            .await
            .unwrap();
        repo.upsert_bars("005930", &[bar((2024, 3, 15), dec!(105))])
            .await
            .unwrap();

        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let stored = repo.range("005930", None, end).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].close, dec!(105));
    }

    #[tokio::test]
    async fn test_range_bounds_and_order() {
        let (_dir, repo) = temp_repo();
        let bars = vec![
            bar((2024, 3, 13), dec!(99)),
            bar((2024, 3, 14), dec!(100)),
            bar((2024, 3, 15), dec!(103)),
        ];
        repo.upsert_bars("005930", &bars).await.unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let stored = repo.range("005930", Some(start), end).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].close, dec!(100));

        let all = repo
            .range("005930", None, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
            .unwrap();
        assert!(all.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn test_unknown_code_is_empty_not_error() {
        let (_dir, repo) = temp_repo();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert!(repo.range("999999", None, end).unwrap().is_empty());
        assert!(repo.latest_close("999999").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_close() {
        let (_dir, repo) = temp_repo();
        let bars = vec![bar((2024, 3, 14), dec!(100)), bar((2024, 3, 15), dec!(103))];
        repo.upsert_bars("005930", &bars).await.unwrap();

        let (date, close) = repo.latest_close("005930").unwrap().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(close, dec!(103));
    }
}

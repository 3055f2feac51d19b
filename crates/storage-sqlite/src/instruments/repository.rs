//! Instrument repository: listing upserts and universe reads.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;

use investar_core::errors::Error;
use investar_core::models::Instrument;
use investar_core::store::InstrumentStore;
use investar_core::Result;
use investar_market_data::{Country, ListingRow};

use super::model::{InstrumentDB, DATE_FORMAT};
use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::schema::instruments::dsl as instruments_dsl;
use crate::utils::chunk_for_sqlite;

pub struct InstrumentRepository {
    pool: Arc<DbPool>,
}

impl InstrumentRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstrumentStore for InstrumentRepository {
    async fn upsert_listing(
        &self,
        country: Country,
        rows: &[ListingRow],
        today: NaiveDate,
    ) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let db_rows: Vec<InstrumentDB> = rows
            .iter()
            .map(|row| InstrumentDB::from_listing(row, country, today))
            .collect();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn = get_connection(&pool)?;
            let mut total = 0;
            for chunk in chunk_for_sqlite(&db_rows) {
                total += diesel::replace_into(instruments_dsl::instruments)
                    .values(chunk)
                    .execute(&mut conn)
                    .map_err(|e| e.into_core())?;
            }
            Ok(total)
        })
        .await
        .map_err(|e| Error::Unexpected(e.to_string()))?
    }

    fn max_last_update(&self, country: Country) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<String> = instruments_dsl::instruments
            .filter(instruments_dsl::country.eq(country.as_str()))
            .select(diesel::dsl::max(instruments_dsl::last_update))
            .first(&mut conn)
            .map_err(|e| e.into_core())?;
        match latest {
            Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map(Some)
                .map_err(|e| Error::Unexpected(format!("last_update '{}': {}", raw, e))),
            None => Ok(None),
        }
    }

    fn list(&self, country: Option<Country>) -> Result<Vec<Instrument>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = instruments_dsl::instruments
            .order(instruments_dsl::code.asc())
            .into_boxed();
        if let Some(country) = country {
            query = query.filter(instruments_dsl::country.eq(country.as_str()));
        }
        let rows: Vec<InstrumentDB> = query.load(&mut conn).map_err(|e| e.into_core())?;
        rows.into_iter()
            .map(|db| Instrument::try_from(db).map_err(Error::from))
            .collect()
    }

    /// Case-insensitive exact match on code or company, then a company
    /// substring match. Reads only; a miss is `Ok(None)`.
    fn find(&self, query: &str) -> Result<Option<Instrument>> {
        let mut conn = get_connection(&self.pool)?;

        let exact: Vec<InstrumentDB> = sql_query(
            "SELECT * FROM instruments
             WHERE lower(code) = lower(?) OR lower(company) = lower(?)
             LIMIT 1",
        )
        .bind::<Text, _>(query)
        .bind::<Text, _>(query)
        .load(&mut conn)
        .map_err(|e| e.into_core())?;
        if let Some(db) = exact.into_iter().next() {
            return Ok(Some(Instrument::try_from(db)?));
        }

        let fuzzy: Vec<InstrumentDB> = sql_query(
            "SELECT * FROM instruments
             WHERE company LIKE ?
             ORDER BY code
             LIMIT 1",
        )
        .bind::<Text, _>(format!("%{}%", query))
        .load(&mut conn)
        .map_err(|e| e.into_core())?;
        match fuzzy.into_iter().next() {
            Some(db) => Ok(Some(Instrument::try_from(db)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    fn listing_row(code: &str, company: &str) -> ListingRow {
        ListingRow {
            code: code.to_string(),
            company: company.to_string(),
            market: Some("KOSPI".to_string()),
            marketcap: None,
            change_pct: None,
            sector: None,
        }
    }

    fn temp_repo() -> (tempfile::TempDir, InstrumentRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instruments.db");
        let pool = Arc::new(create_pool(path.to_str().unwrap()).unwrap());
        (dir, InstrumentRepository::new(pool))
    }

    #[tokio::test]
    async fn test_upsert_listing_is_idempotent() {
        let (_dir, repo) = temp_repo();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let rows = vec![
            listing_row("005930", "삼성전자"),
            listing_row("000660", "SK하이닉스"),
        ];

        repo.upsert_listing(Country::Kr, &rows, today).await.unwrap();
        repo.upsert_listing(Country::Kr, &rows, today).await.unwrap();

        let all = repo.list(Some(Country::Kr)).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(repo.max_last_update(Country::Kr).unwrap(), Some(today));
    }

    #[tokio::test]
    async fn test_find_exact_before_substring() {
        let (_dir, repo) = temp_repo();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let rows = vec![
            listing_row("005930", "삼성전자"),
            listing_row("AAPL", "Apple Inc"),
        ];
        repo.upsert_listing(Country::Kr, &rows, today).await.unwrap();

        let by_code = repo.find("aapl").unwrap().unwrap();
        assert_eq!(by_code.code, "AAPL");

        let by_name = repo.find("apple inc").unwrap().unwrap();
        assert_eq!(by_name.code, "AAPL");

        let by_substring = repo.find("Apple").unwrap().unwrap();
        assert_eq!(by_substring.code, "AAPL");

        assert!(repo.find("Nothing Matches").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_max_last_update_empty_universe() {
        let (_dir, repo) = temp_repo();
        assert_eq!(repo.max_last_update(Country::Us).unwrap(), None);
    }
}

//! Database model for the instrument universe.

use chrono::NaiveDate;
use diesel::prelude::*;
use investar_core::models::Instrument;
use investar_market_data::{Country, ListingRow};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// Dates are stored as ISO `YYYY-MM-DD` text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

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
#[diesel(table_name = crate::schema::instruments)]
#[diesel(primary_key(code))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstrumentDB {
    pub code: String,
    pub company: String,
    pub market: Option<String>,
    pub country: String,
    pub last_update: String,
    pub marketcap: Option<f64>,
    pub change_pct: Option<f64>,
    pub sector: Option<String>,
}

impl InstrumentDB {
    /// Builds the row a listing refresh writes: the provider's fields
    /// plus the country tag and today's stamp.
    pub fn from_listing(row: &ListingRow, country: Country, today: NaiveDate) -> Self {
        InstrumentDB {
            code: row.code.clone(),
            company: row.company.clone(),
            market: row.market.clone(),
            country: country.as_str().to_string(),
            last_update: today.format(DATE_FORMAT).to_string(),
            marketcap: row.marketcap.and_then(|d| d.to_f64()),
            change_pct: row.change_pct.and_then(|d| d.to_f64()),
            sector: row.sector.clone(),
        }
    }
}

impl TryFrom<InstrumentDB> for Instrument {
    type Error = StorageError;

    fn try_from(db: InstrumentDB) -> Result<Self, Self::Error> {
        let last_update = NaiveDate::parse_from_str(&db.last_update, DATE_FORMAT)
            .map_err(|e| StorageError::Coercion(format!("last_update '{}': {}", db.last_update, e)))?;
        Ok(Instrument {
            code: db.code,
            company: db.company,
            market: db.market,
            country: db.country,
            last_update,
            marketcap: db.marketcap.and_then(Decimal::from_f64_retain),
            change_pct: db.change_pct.and_then(Decimal::from_f64_retain),
            sector: db.sector,
        })
    }
}

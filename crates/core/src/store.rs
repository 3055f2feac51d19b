//! Store traits implemented by the storage crate.
//!
//! Mutations are async so the storage layer can move blocking work off
//! the runtime; reads are synchronous and cheap against the local
//! cache.

use async_trait::async_trait;
use chrono::NaiveDate;
use investar_market_data::{Country, DailyBar, ListingRow};
use rust_decimal::Decimal;

use crate::models::{Instrument, PriceBar};
use crate::Result;

/// Persistence for the instrument universe.
#[async_trait]
pub trait InstrumentStore: Send + Sync {
    /// Upserts one country's listing, stamping every row with `today`.
    /// Returns the number of rows written.
    async fn upsert_listing(
        &self,
        country: Country,
        rows: &[ListingRow],
        today: NaiveDate,
    ) -> Result<usize>;

    /// Most recent `last_update` across one country's instruments;
    /// `None` for an empty universe. Drives the staleness check.
    fn max_last_update(&self, country: Country) -> Result<Option<NaiveDate>>;

    /// The cached universe, optionally filtered by country, ordered by
    /// code.
    fn list(&self, country: Option<Country>) -> Result<Vec<Instrument>>;

    /// Case-insensitive exact match on code or company, then a company
    /// substring match. A miss is `Ok(None)` with no side effect.
    fn find(&self, query: &str) -> Result<Option<Instrument>>;
}

/// Persistence for cached daily bars.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Upserts one instrument's bars keyed `(code, date)`. Returns the
    /// number of rows written.
    async fn upsert_bars(&self, code: &str, bars: &[DailyBar]) -> Result<usize>;

    /// Bars within `[start, end]` ascending by date; unbounded at the
    /// start when `start` is `None`. Empty result is `Ok(vec![])`.
    fn range(&self, code: &str, start: Option<NaiveDate>, end: NaiveDate) -> Result<Vec<PriceBar>>;

    /// Date and close of the most recent cached bar.
    fn latest_close(&self, code: &str) -> Result<Option<(NaiveDate, Decimal)>>;
}

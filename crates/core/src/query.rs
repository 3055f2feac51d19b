//! Query service: resolving user input to instruments and serving
//! cached history.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use investar_market_data::{Country, FetchWindow};
use log::info;
use rust_decimal::Decimal;

use crate::errors::{Error, Result};
use crate::models::{Instrument, PriceBar};
use crate::store::{InstrumentStore, PriceStore};
use crate::sync::SyncService;

pub struct QueryService {
    instruments: Arc<dyn InstrumentStore>,
    prices: Arc<dyn PriceStore>,
    sync: Arc<SyncService>,
}

impl QueryService {
    pub fn new(
        instruments: Arc<dyn InstrumentStore>,
        prices: Arc<dyn PriceStore>,
        sync: Arc<SyncService>,
    ) -> Self {
        QueryService {
            instruments,
            prices,
            sync,
        }
    }

    /// Resolves a code or company-name query against the cached
    /// universe only. A miss is [`Error::CodeNotFound`] and leaves the
    /// database untouched.
    pub fn resolve_readonly(&self, query: &str) -> Result<Instrument> {
        self.instruments
            .find(query)?
            .ok_or_else(|| Error::CodeNotFound(query.to_string()))
    }

    /// Resolves a query, and on a miss refreshes the listing universe
    /// and retries. A newly registered instrument gets an initial full
    /// history backfill before it is returned. A query that still
    /// matches nothing is [`Error::CodeNotFound`], and no instrument
    /// row is created for it.
    pub async fn resolve_or_register(&self, query: &str) -> Result<Instrument> {
        if let Ok(instrument) = self.resolve_readonly(query) {
            return Ok(instrument);
        }

        info!("'{}' not cached, refreshing listings", query);
        for country in Country::all() {
            self.sync.refresh_listing(country, true).await?;
        }

        let instrument = self.resolve_readonly(query)?;
        let (instrument, written) = self
            .sync
            .update_instrument(&instrument.code, FetchWindow::Full)
            .await?;
        info!("Registered {} with {} bars", instrument.code, written);
        Ok(instrument)
    }

    /// Cached daily bars for `code`, ascending, `end` defaulting to
    /// today. An unknown code or empty window yields `Ok(vec![])`.
    pub fn get_price_history(
        &self,
        code: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>> {
        let end = end.unwrap_or_else(|| Local::now().date_naive());
        self.prices.range(code, start, end)
    }

    /// The cached universe, optionally filtered by country.
    pub fn list_instruments(&self, country: Option<Country>) -> Result<Vec<Instrument>> {
        self.instruments.list(country)
    }

    /// Date and close of the most recent cached bar for `code`.
    pub fn latest_close(&self, code: &str) -> Result<Option<(NaiveDate, Decimal)>> {
        self.prices.latest_close(code)
    }
}

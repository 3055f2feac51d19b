//! Synchronization service: listing refresh and fan-out price sync.
//!
//! A sync pass never hard-fails on one instrument: per-instrument
//! errors are logged, counted in the report, and the pass moves on.
//! Cancellation is cooperative: the token is checked before each task
//! is dispatched, and tasks already in flight finish naturally.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Local;
use futures::future::ready;
use futures::{stream, StreamExt};
use log::{debug, error, info, warn};

use investar_market_data::{Country, FetchWindow, ListingProvider, PriceProvider};

use crate::constants::DEFAULT_SYNC_WORKERS;
use crate::errors::{Error, Result};
use crate::models::Instrument;
use crate::store::{InstrumentStore, PriceStore};

/// Cooperative stop signal for a running sync pass. Cloneable; all
/// clones observe the same cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which countries a sync pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountrySelector {
    All,
    One(Country),
}

impl CountrySelector {
    pub fn countries(&self) -> Vec<Country> {
        match self {
            CountrySelector::All => Country::all().to_vec(),
            CountrySelector::One(country) => vec![*country],
        }
    }
}

/// Tunables for the sync service.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Concurrent fetch-and-write tasks during a price sync.
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            workers: DEFAULT_SYNC_WORKERS,
        }
    }
}

/// Outcome of a price-sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Instruments enumerated for the pass.
    pub total: usize,
    /// Instruments whose fetch-and-write completed.
    pub synced: usize,
    /// Instruments whose fetch or write failed.
    pub failed: usize,
    /// Price rows written across the pass.
    pub bars_written: usize,
    /// True when the pass stopped early on cancellation.
    pub stopped: bool,
}

pub struct SyncService {
    instruments: Arc<dyn InstrumentStore>,
    prices: Arc<dyn PriceStore>,
    listing_providers: Vec<Arc<dyn ListingProvider>>,
    price_providers: Vec<(Country, Arc<dyn PriceProvider>)>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(
        instruments: Arc<dyn InstrumentStore>,
        prices: Arc<dyn PriceStore>,
        listing_providers: Vec<Arc<dyn ListingProvider>>,
        price_providers: Vec<(Country, Arc<dyn PriceProvider>)>,
        config: SyncConfig,
    ) -> Self {
        SyncService {
            instruments,
            prices,
            listing_providers,
            price_providers,
            config,
        }
    }

    /// Refreshes one country's listing universe unless it was already
    /// refreshed today. Returns the number of rows written; a
    /// same-day repeat is a no-op returning zero.
    pub async fn sync_listing(&self, country: Country) -> Result<usize> {
        self.refresh_listing(country, false).await
    }

    /// Listing refresh with an optional staleness-check bypass, used
    /// by on-demand registration.
    pub async fn refresh_listing(&self, country: Country, force: bool) -> Result<usize> {
        let today = Local::now().date_naive();
        if !force && self.instruments.max_last_update(country)? == Some(today) {
            debug!("Listing for {} already refreshed today, skipping", country);
            return Ok(0);
        }

        let Some(provider) = self
            .listing_providers
            .iter()
            .find(|p| p.country() == country)
        else {
            warn!("No listing provider registered for {}", country);
            return Ok(0);
        };

        let rows = match provider.fetch_listing().await {
            Ok(rows) => rows,
            Err(e) => {
                // Keep the previously cached universe for this cycle.
                warn!("Listing refresh for {} failed: {}", country, e);
                return Ok(0);
            }
        };
        if rows.is_empty() {
            warn!("Listing refresh for {} returned no rows", country);
            return Ok(0);
        }

        let written = self
            .instruments
            .upsert_listing(country, &rows, today)
            .await?;
        info!("Listing for {} refreshed: {} instruments", country, written);
        Ok(written)
    }

    /// Fetches and writes daily history for every instrument the
    /// selector covers, fanning out over a bounded worker pool.
    pub async fn sync_prices(
        &self,
        selector: CountrySelector,
        window: FetchWindow,
        token: &CancellationToken,
    ) -> Result<SyncReport> {
        let mut targets: Vec<Instrument> = Vec::new();
        for country in selector.countries() {
            targets.extend(self.instruments.list(Some(country))?);
        }
        let total = targets.len();
        info!("Price sync: {} instruments, {:?}", total, selector);

        let done = AtomicUsize::new(0);
        let outcomes: Vec<std::result::Result<usize, String>> = stream::iter(targets)
            .take_while(|_| ready(!token.is_cancelled()))
            .map(|instrument| {
                let done = &done;
                async move {
                    let code = instrument.code.clone();
                    let outcome = self.sync_instrument(&instrument, window).await;
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    match outcome {
                        Ok(written) => {
                            info!("({}/{}) [{}] {} bars", finished, total, code, written);
                            Ok(written)
                        }
                        Err(e) => {
                            error!("({}/{}) [{}] failed: {}", finished, total, code, e);
                            Err(code)
                        }
                    }
                }
            })
            .buffer_unordered(self.config.workers)
            .collect()
            .await;

        let mut report = SyncReport {
            total,
            stopped: token.is_cancelled(),
            ..SyncReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(written) => {
                    report.synced += 1;
                    report.bars_written += written;
                }
                Err(_) => report.failed += 1,
            }
        }
        info!(
            "Price sync finished: {}/{} synced, {} failed, {} bars{}",
            report.synced,
            report.total,
            report.failed,
            report.bars_written,
            if report.stopped { " (stopped)" } else { "" }
        );
        Ok(report)
    }

    /// Single-instrument resolve, fetch and write. Used by on-demand
    /// lookups and backfills.
    pub async fn update_instrument(
        &self,
        query: &str,
        window: FetchWindow,
    ) -> Result<(Instrument, usize)> {
        let instrument = self
            .instruments
            .find(query)?
            .ok_or_else(|| Error::CodeNotFound(query.to_string()))?;
        let written = self.sync_instrument(&instrument, window).await?;
        Ok((instrument, written))
    }

    /// Daily driver: refresh every listing, then sync every price
    /// series.
    pub async fn sync_all(
        &self,
        window: FetchWindow,
        token: &CancellationToken,
    ) -> Result<SyncReport> {
        for country in Country::all() {
            self.sync_listing(country).await?;
        }
        self.sync_prices(CountrySelector::All, window, token).await
    }

    async fn sync_instrument(&self, instrument: &Instrument, window: FetchWindow) -> Result<usize> {
        let country = instrument.country_tag();
        let provider = self
            .price_providers
            .iter()
            .find(|(c, _)| *c == country)
            .map(|(_, p)| p)
            .ok_or_else(|| {
                Error::Validation(format!("no price provider for {}", country))
            })?;

        let bars = provider
            .fetch_daily_history(&instrument.code, window)
            .await?;
        if bars.is_empty() {
            debug!("[{}] no bars from {}", instrument.code, provider.id());
            return Ok(0);
        }
        self.prices.upsert_bars(&instrument.code, &bars).await
    }
}

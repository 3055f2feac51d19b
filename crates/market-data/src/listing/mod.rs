//! Listing providers: the current universe of tradable instruments per
//! country, scraped from exchange ranking and index membership pages.

pub mod naver;
pub mod slickcharts;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Country, ListingRow};

/// A source of the instrument universe for one country.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// The country this provider's universe belongs to.
    fn country(&self) -> Country;

    /// Fetches the full current listing. An unreachable source or an
    /// unexpected page structure surfaces as an error; the caller logs
    /// it and keeps the previously cached universe.
    async fn fetch_listing(&self) -> Result<Vec<ListingRow>, MarketDataError>;
}

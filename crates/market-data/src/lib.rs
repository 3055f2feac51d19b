//! Investar Market Data Crate
//!
//! Provider adapters for the market database: instrument listings and daily
//! OHLCV history, fetched from per-country upstream sources.
//!
//! # Overview
//!
//! Two adapter families share this crate:
//! - [`ListingProvider`]: retrieves the current universe of tradable
//!   instruments for one country (exchange ranking pages, index membership
//!   pages) and normalizes it into [`ListingRow`]s.
//! - [`PriceProvider`]: retrieves a daily OHLCV series for one instrument
//!   from a specific upstream source, with provider-specific pagination,
//!   retry, and symbol-variant fallback.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Sync / Query    | --> | ListingProvider  |  (per country)
//! |  (core crate)    |     +------------------+
//! +------------------+     +------------------+
//!          \--------------> |  PriceProvider  |  (per country / source)
//!                           +------------------+
//!                                   |
//!                                   v
//!                           +------------------+
//!                           |    DailyBar      |  (normalized OHLCV)
//!                           +------------------+
//! ```
//!
//! Providers degrade gracefully: network failures are retried per provider
//! policy and then surfaced as an empty series; a page or payload whose
//! structure no longer matches expectations is a [`MarketDataError::Parse`]
//! and is never retried.

pub mod errors;
pub mod listing;
pub mod models;
pub mod parse;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{Country, DailyBar, FetchWindow, ListingRow};

pub use listing::naver::NaverListingProvider;
pub use listing::slickcharts::SlickchartsListingProvider;
pub use listing::ListingProvider;
pub use provider::naver::{NaverConfig, NaverDailyProvider};
pub use provider::yahoo::{YahooConfig, YahooDailyProvider};
pub use provider::PriceProvider;

//! Investar Core Crate
//!
//! Database-agnostic domain layer of the market database: the
//! instrument and price-bar models, the store traits implemented by the
//! storage crate, and the two services on top of them:
//!
//! - [`sync::SyncService`]: keeps the local cache current (listing
//!   refresh with a per-country staleness check, fan-out price sync
//!   with cooperative cancellation).
//! - [`query::QueryService`]: resolves user queries to instruments and
//!   serves cached price history.

pub mod constants;
pub mod errors;
pub mod models;
pub mod query;
pub mod store;
pub mod sync;


pub use errors::{DatabaseError, Error, Result};
pub use models::{Instrument, PriceBar};
pub use query::QueryService;
pub use sync::{CancellationToken, CountrySelector, SyncConfig, SyncReport, SyncService};

//! SQLite storage for the Investar market database.
//!
//! This crate is the only place Diesel exists: it implements the
//! database-agnostic store traits from `investar-core` on top of a
//! pooled SQLite connection. The schema is managed in place, with a
//! destructive rebuild when the live price table's column set has
//! drifted from the expected layout.

pub mod db;
pub mod errors;
pub mod instruments;
pub mod prices;
pub mod schema;
pub mod schema_manager;
pub mod utils;

pub use db::{create_pool, get_connection, DbPool};
pub use errors::{IntoCore, StorageError};
pub use instruments::InstrumentRepository;
pub use prices::PriceRepository;
pub use schema_manager::{ensure_schema, reset_table};

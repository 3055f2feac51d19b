//! Connection pool setup.
//!
//! One r2d2 pool of SQLite connections, sized to the sync worker width
//! so every fetch-and-write task can hold its own connection. Pragmas
//! for concurrent access are applied to each connection as it joins the
//! pool, and the schema is verified once at pool creation.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::SqliteConnection;
use investar_core::errors::{DatabaseError, Error};
use investar_core::Result;
use log::info;

use crate::schema_manager;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pool width. Matches the price-sync fan-out so workers never queue on
/// a connection.
const POOL_MAX_SIZE: u32 = 10;

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 5000;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates the pool for the database at `db_path` and makes sure the
/// schema is in its expected shape.
///
/// An unwritable or unopenable location surfaces as
/// [`DatabaseError::ConnectionFailed`] and is never retried.
pub fn create_pool(db_path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))?;

    let mut conn = get_connection(&pool)?;
    schema_manager::ensure_schema(&mut conn)?;
    info!("Database ready at {}", db_path);
    Ok(pool)
}

/// Checks out one connection; it returns to the pool on drop.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::ConnectionFailed(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.db");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        assert!(get_connection(&pool).is_ok());
    }

    #[test]
    fn test_unwritable_location_is_connection_failure() {
        let err = create_pool("/nonexistent-dir/market.db").unwrap_err();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::ConnectionFailed(_))
        ));
    }
}

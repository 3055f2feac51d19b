//! Schema lifecycle: creation and column-drift detection.
//!
//! Tables are created in place with `CREATE TABLE IF NOT EXISTS`. The
//! price table's live column set is additionally compared against the
//! expected layout; a mismatch drops and recreates the table empty.
//! The rebuild is destructive and logged as a warning, and cached
//! history is refilled by the next full sync.

use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::{QueryableByName, RunQueryDsl, SqliteConnection};
use investar_core::Result;
use log::{debug, warn};

use crate::errors::{IntoCore, StorageError};

const CREATE_INSTRUMENTS: &str = "
    CREATE TABLE IF NOT EXISTS instruments (
        code        TEXT PRIMARY KEY NOT NULL,
        company     TEXT NOT NULL,
        market      TEXT,
        country     TEXT NOT NULL,
        last_update TEXT NOT NULL,
        marketcap   DOUBLE,
        change_pct  DOUBLE,
        sector      TEXT
    )";

const CREATE_DAILY_PRICES: &str = "
    CREATE TABLE IF NOT EXISTS daily_prices (
        code   TEXT NOT NULL,
        date   TEXT NOT NULL,
        open   DOUBLE NOT NULL,
        high   DOUBLE NOT NULL,
        low    DOUBLE NOT NULL,
        close  DOUBLE NOT NULL,
        diff   DOUBLE NOT NULL,
        volume BIGINT NOT NULL,
        PRIMARY KEY (code, date)
    )";

/// Expected column set of `daily_prices`, order-independent.
const DAILY_PRICE_COLUMNS: [&str; 8] = [
    "code", "date", "open", "high", "low", "close", "diff", "volume",
];

#[derive(QueryableByName)]
struct PragmaRow {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Brings the schema to its expected shape.
///
/// Creates missing tables, then checks the live `daily_prices` column
/// set; on drift the table is dropped and recreated empty.
pub fn ensure_schema(conn: &mut SqliteConnection) -> Result<()> {
    sql_query(CREATE_INSTRUMENTS)
        .execute(conn)
        .map_err(|e| e.into_core())?;
    sql_query(CREATE_DAILY_PRICES)
        .execute(conn)
        .map_err(|e| e.into_core())?;

    let live = live_columns(conn, "daily_prices")?;
    if columns_match(&live) {
        debug!("daily_prices schema is current");
        return Ok(());
    }

    warn!(
        "daily_prices column set drifted (live: {:?}); dropping and recreating, cached history is lost",
        live
    );
    sql_query("DROP TABLE daily_prices")
        .execute(conn)
        .map_err(|e| e.into_core())?;
    sql_query(CREATE_DAILY_PRICES)
        .execute(conn)
        .map_err(|e| e.into_core())?;
    Ok(())
}

/// Drops and recreates one managed table on demand, losing its rows.
pub fn reset_table(conn: &mut SqliteConnection, table: &str) -> Result<()> {
    let create = match table {
        "instruments" => CREATE_INSTRUMENTS,
        "daily_prices" => CREATE_DAILY_PRICES,
        other => {
            return Err(
                StorageError::SchemaFailed(format!("unknown table: {}", other)).into(),
            )
        }
    };
    warn!("Resetting table {}", table);
    sql_query(format!("DROP TABLE IF EXISTS {}", table))
        .execute(conn)
        .map_err(|e| e.into_core())?;
    sql_query(create).execute(conn).map_err(|e| e.into_core())?;
    Ok(())
}

fn live_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
    let rows: Vec<PragmaRow> = sql_query(format!(
        "SELECT name FROM pragma_table_info('{}')",
        table
    ))
    .load(conn)
    .map_err(|e| e.into_core())?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

fn columns_match(live: &[String]) -> bool {
    if live.len() != DAILY_PRICE_COLUMNS.len() {
        return false;
    }
    DAILY_PRICE_COLUMNS
        .iter()
        .all(|expected| live.iter().any(|c| c == expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::Connection;

    fn temp_conn() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.db");
        let conn = SqliteConnection::establish(path.to_str().unwrap()).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_ensure_schema_creates_tables() {
        let (_dir, mut conn) = temp_conn();
        ensure_schema(&mut conn).unwrap();
        let live = live_columns(&mut conn, "daily_prices").unwrap();
        assert!(columns_match(&live));
        assert!(!live_columns(&mut conn, "instruments").unwrap().is_empty());
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let (_dir, mut conn) = temp_conn();
        ensure_schema(&mut conn).unwrap();
        sql_query(
            "INSERT INTO daily_prices VALUES ('005930', '2024-03-15', 1.0, 2.0, 0.5, 1.5, 0.0, 10)",
        )
        .execute(&mut conn)
        .unwrap();
        ensure_schema(&mut conn).unwrap();

        #[derive(QueryableByName)]
        struct CountRow {
            #[diesel(sql_type = diesel::sql_types::BigInt)]
            n: i64,
        }
        let rows: Vec<CountRow> = sql_query("SELECT COUNT(*) AS n FROM daily_prices")
            .load(&mut conn)
            .unwrap();
        assert_eq!(rows[0].n, 1);
    }

    #[test]
    fn test_drifted_price_table_is_rebuilt_empty() {
        let (_dir, mut conn) = temp_conn();
        ensure_schema(&mut conn).unwrap();
        sql_query(
            "INSERT INTO daily_prices VALUES ('005930', '2024-03-15', 1.0, 2.0, 0.5, 1.5, 0.0, 10)",
        )
        .execute(&mut conn)
        .unwrap();
        sql_query("ALTER TABLE daily_prices ADD COLUMN extra TEXT")
            .execute(&mut conn)
            .unwrap();

        ensure_schema(&mut conn).unwrap();

        let live = live_columns(&mut conn, "daily_prices").unwrap();
        assert!(columns_match(&live));

        #[derive(QueryableByName)]
        struct CountRow {
            #[diesel(sql_type = diesel::sql_types::BigInt)]
            n: i64,
        }
        let rows: Vec<CountRow> = sql_query("SELECT COUNT(*) AS n FROM daily_prices")
            .load(&mut conn)
            .unwrap();
        assert_eq!(rows[0].n, 0, "rebuild is lossy");
    }

    #[test]
    fn test_reset_table_rejects_unknown_names() {
        let (_dir, mut conn) = temp_conn();
        ensure_schema(&mut conn).unwrap();
        assert!(reset_table(&mut conn, "sqlite_master").is_err());
        assert!(reset_table(&mut conn, "daily_prices").is_ok());
    }
}

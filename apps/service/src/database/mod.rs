/// Persistence layer
///
/// Two append-only relations back the whole system: the `ip_current`
/// singleton (the tracked address) and the `checks` log (probe history).
/// The layout matches existing stores, so it is bootstrapped in place with
/// `CREATE TABLE IF NOT EXISTS` rather than versioned migrations.
pub mod models;
pub mod repository;

pub use repository::{Database, LibsqlDatabase};

use anyhow::Result;

pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS ip_current (
            id INTEGER PRIMARY KEY,
            ip TEXT,
            updated_at TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS checks (
            id INTEGER PRIMARY KEY,
            ip TEXT,
            time TIMESTAMP,
            reachable INTEGER,
            method TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_checks_time ON checks(time DESC);",
    )
    .await?;

    Ok(())
}

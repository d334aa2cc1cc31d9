//! Connection bootstrap for the ledger database.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have a non-zero busy timeout, so a writer that
//!   finds the database locked by another ledger transaction waits instead
//!   of failing immediately.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::fmt::Display;
use std::path::Path;
use std::time::{Duration, Instant};

/// Busy timeout applied by [`open_db`] and [`open_db_in_memory`].
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a ledger database file.
///
/// # Side effects
/// - Applies pending migrations.
/// - Emits `db_open` events with mode, status and duration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// [`open_db`] with a caller-chosen busy timeout.
pub fn open_db_with_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    open_with("file", busy_timeout, || Connection::open(path))
}

/// Opens a private in-memory ledger. Each call yields an empty database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", DEFAULT_BUSY_TIMEOUT, Connection::open_in_memory)
}

fn open_with<F>(mode: &'static str, busy_timeout: Duration, connect: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = connect().map_err(|err| {
        log_failure(mode, started_at, "db_open_failed", &err);
        err
    })?;
    if let Err(err) = bootstrap(&mut conn, busy_timeout) {
        log_failure(mode, started_at, "db_bootstrap_failed", &err);
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={mode} busy_timeout_ms={} duration_ms={}",
        busy_timeout.as_millis(),
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)
}

fn log_failure(mode: &str, started_at: Instant, code: &str, err: &dyn Display) {
    error!(
        "event=db_open module=db status=error mode={mode} duration_ms={} error_code={code} error={err}",
        started_at.elapsed().as_millis()
    );
}

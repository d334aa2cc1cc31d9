//! Ordered schema scripts for the ledger database.
//!
//! # Invariants
//! - Versions are dense and increasing; a script is never edited once
//!   released, only followed by a new one.
//! - `PRAGMA user_version` is bumped in the same transaction as its script.
//! - Ledger invariants that SQLite can express (capacity bound, one active
//!   stay per person, check-out iff closed) live in the schema as well.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "directories",
        sql: include_str!("0001_directories.sql"),
    },
    Migration {
        version: 2,
        name: "occupancy_records",
        sql: include_str!("0002_occupancy_records.sql"),
    },
    Migration {
        version: 3,
        name: "inventory_alerts",
        sql: include_str!("0003_inventory_alerts.sql"),
    },
];

/// Schema revision this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let supported = latest_version();
    let found = current_user_version(conn)?;
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    // Immediate: two processes opening a fresh file must not both migrate.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let locked: u32 = tx.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > locked) {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    Ok(())
}

/// Schema revision recorded in the file.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

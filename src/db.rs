//! Local SQLite database layer for the back-office store.
//!
//! Uses rusqlite with WAL mode. Each record collection lives as a JSON
//! array under a named slot in the `collections` table; scalar content
//! values share the same table. Provides schema migrations and the slot
//! upsert helpers the store is built on.

use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Shared state holding the database connection for one store handle.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Initialize the database at `{data_dir}/backoffice.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(data_dir: &Path) -> Result<DbState> {
    fs::create_dir_all(data_dir)
        .map_err(|e| Error::Storage(format!("failed to create data dir: {e}")))?;

    let db_path = data_dir.join("backoffice.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!(
                "Database open failed ({}), deleting and retrying once",
                first_err
            );
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                // Also remove WAL/SHM files if present
                let wal = db_path.with_extension("db-wal");
                let shm = db_path.with_extension("db-shm");
                let _ = fs::remove_file(&wal);
                let _ = fs::remove_file(&shm);
            }
            open_and_configure(&db_path)
                .map_err(|e| Error::Storage(format!("database open failed after retry: {e}")))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| Error::Storage(format!("sqlite open: {e}")))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| Error::Storage(format!("pragma setup: {e}")))?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<()> {
    // Ensure schema_version table exists first
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| Error::Storage(format!("create schema_version: {e}")))?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Migration v1: the collections slot table.
///
/// One row per collection; `data` holds the full serialized snapshot.
/// Replacing a snapshot is a single upsert, which is what makes every
/// store write atomic from the caller's perspective.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS collections (
            slot TEXT PRIMARY KEY,
            data TEXT NOT NULL DEFAULT '[]',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
    .map_err(|e| {
        error!("Migration v1 failed: {e}");
        Error::Storage(format!("migration v1: {e}"))
    })?;

    info!("Applied migration v1 (collections table)");
    Ok(())
}

// ---------------------------------------------------------------------------
// Slot helpers
// ---------------------------------------------------------------------------

/// Read a slot's raw serialized value. `None` when the slot has never been
/// written, which readers treat as an empty collection.
pub fn get_slot(conn: &Connection, slot: &str) -> Option<String> {
    conn.query_row(
        "SELECT data FROM collections WHERE slot = ?1",
        params![slot],
        |row| row.get(0),
    )
    .ok()
}

/// Replace a slot's value in one upsert.
pub fn set_slot(conn: &Connection, slot: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO collections (slot, data, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(slot) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at",
        params![slot, value],
    )
    .map_err(|e| Error::Storage(format!("set_slot {slot}: {e}")))?;
    Ok(())
}

/// Delete a slot. Silently succeeds when the slot does not exist. Returns
/// whether a row was removed.
pub fn delete_slot(conn: &Connection, slot: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM collections WHERE slot = ?1", params![slot])
        .map_err(|e| Error::Storage(format!("delete_slot {slot}: {e}")))?;
    Ok(removed > 0)
}

/// Whether a slot has ever been written. The seed initializer checks this
/// before writing defaults.
pub fn slot_exists(conn: &Connection, slot: &str) -> bool {
    conn.query_row(
        "SELECT 1 FROM collections WHERE slot = ?1",
        params![slot],
        |row| row.get::<_, i32>(0),
    )
    .is_ok()
}

// ===========================================================================
// Tests
// ===========================================================================

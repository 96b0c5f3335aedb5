//! Database schema migrations for medalroom.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < CURRENT_VERSION {
        tracing::info!(from = current_version, to = CURRENT_VERSION, "database migrated");
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version; 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i32>>(0)
    }) {
        Ok(version) => Ok(version.unwrap_or(0)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(tx: &Connection, version: i32) -> SqliteResult<()> {
    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: timer records.
///
/// `spent_ms` keeps the millisecond precision of imported data; sums are
/// converted to seconds on read. `external_id` makes imports idempotent.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS timers (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT UNIQUE,
            name        TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            fixated_on  TEXT NOT NULL,
            spent_ms    INTEGER NOT NULL CHECK (spent_ms >= 0),
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_timers_fixated_on ON timers(fixated_on);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: reward snapshots and the wallet.
///
/// - reward_days: one row per reconciled date, even when nothing was earned
/// - rewards_daily: non-zero medal counts of each snapshot
/// - wallet: a single row holding every medal, a revision and a timestamp
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS reward_days (
            day           TEXT PRIMARY KEY,
            reconciled_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rewards_daily (
            day   TEXT NOT NULL,
            medal TEXT NOT NULL,
            count INTEGER NOT NULL CHECK (count > 0),
            PRIMARY KEY (day, medal)
        );

        CREATE TABLE IF NOT EXISTS wallet (
            id         INTEGER PRIMARY KEY CHECK (id = 1),
            wood       INTEGER NOT NULL DEFAULT 0 CHECK (wood >= 0),
            steel      INTEGER NOT NULL DEFAULT 0 CHECK (steel >= 0),
            bronze     INTEGER NOT NULL DEFAULT 0 CHECK (bronze >= 0),
            silver     INTEGER NOT NULL DEFAULT 0 CHECK (silver >= 0),
            gold       INTEGER NOT NULL DEFAULT 0 CHECK (gold >= 0),
            revision   INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}

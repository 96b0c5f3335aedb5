//! SQLite-based storage for timers, reward snapshots and the wallet.
//!
//! Provides persistent storage for:
//! - Focus timer records (manual or imported)
//! - Per-day reward snapshots
//! - The medal wallet
//!
//! Every multi-statement write runs inside a savepoint, so a failure halfway
//! leaves the previously committed rows in place. Savepoints nest, which lets
//! [`RewardStore::atomically`] wrap a whole batch of them.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result, ValidationError};
use crate::medal::{Medal, MedalCounts};
use crate::rewards::{FocusTimeSource, RewardStore};

/// A stored focus timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub description: String,
    pub fixated_on: NaiveDate,
    pub spent_ms: i64,
    pub created_at: DateTime<Utc>,
}

/// A timer to be inserted, or updated when `external_id` already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimer {
    pub external_id: Option<String>,
    pub name: String,
    pub description: String,
    pub fixated_on: NaiveDate,
    pub spent_ms: i64,
}

/// The wallet row with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub totals: MedalCounts,
    /// Incremented on every write.
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

/// SQLite database for medalroom.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/medalroom/medalroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("medalroom.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// How long a statement waits for another connection's lock before
    /// failing with [`DatabaseError::Locked`]. Defaults to five seconds.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<(), DatabaseError> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Insert a timer, or update the existing row with the same external id.
    ///
    /// Returns the row id.
    ///
    /// # Errors
    /// Rejects timers with no recorded time.
    pub fn save_timer(&self, timer: &NewTimer) -> Result<i64> {
        if timer.spent_ms <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "spent_ms".to_string(),
                message: format!("timer must record positive time, got {}", timer.spent_ms),
            }
            .into());
        }
        let id = self.conn.query_row(
            "INSERT INTO timers (external_id, name, description, fixated_on, spent_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                fixated_on = excluded.fixated_on,
                spent_ms = excluded.spent_ms
             RETURNING id",
            params![
                timer.external_id,
                timer.name,
                timer.description,
                day_key(timer.fixated_on),
                timer.spent_ms,
                Utc::now().to_rfc3339(),
            ],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(id)
    }

    /// Most recent timers first, at most `limit`.
    pub fn list_timers(&self, limit: u32) -> Result<Vec<TimerRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, external_id, name, description, fixated_on, spent_ms, created_at
             FROM timers
             ORDER BY fixated_on DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut timers = Vec::new();
        for row in rows {
            let (id, external_id, name, description, fixated_on, spent_ms, created_at) = row?;
            timers.push(TimerRecord {
                id,
                external_id,
                name,
                description,
                fixated_on: parse_day("timers", &fixated_on)?,
                spent_ms,
                created_at: parse_timestamp("timers", &created_at)?,
            });
        }
        Ok(timers)
    }

    /// Delete a timer. Returns false if no row had that id.
    pub fn delete_timer(&self, id: i64) -> Result<bool, DatabaseError> {
        let affected = self.conn.execute("DELETE FROM timers WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// All focused seconds ever recorded.
    pub fn total_focused_seconds(&self) -> Result<i64, DatabaseError> {
        let ms: i64 = self
            .conn
            .query_row("SELECT COALESCE(SUM(spent_ms), 0) FROM timers", [], |row| row.get(0))?;
        Ok(ms / 1000)
    }

    /// The wallet row including revision and timestamp.
    pub fn wallet_record(&self) -> Result<Option<WalletRecord>, DatabaseError> {
        read_wallet(&self.conn)
    }

    /// Dates that have a stored snapshot, from `from` to `to` inclusive.
    pub fn reconciled_days(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT day FROM reward_days WHERE day BETWEEN ?1 AND ?2 ORDER BY day")?;
        let rows = stmt.query_map(params![day_key(from), day_key(to)], |row| row.get::<_, String>(0))?;
        let mut days = Vec::new();
        for row in rows {
            days.push(parse_day("reward_days", &row?)?);
        }
        Ok(days)
    }
}

impl RewardStore for Database {
    fn load_snapshot(&self, date: NaiveDate) -> Result<Option<MedalCounts>, DatabaseError> {
        read_snapshot(&self.conn, date)
    }

    fn replace_snapshot(&self, date: NaiveDate, snapshot: &MedalCounts) -> Result<(), DatabaseError> {
        let sp = Savepoint::begin(&self.conn, "replace_snapshot")?;
        write_snapshot(&self.conn, date, snapshot)?;
        sp.release()?;
        Ok(())
    }

    fn swap_snapshot(
        &self,
        date: NaiveDate,
        snapshot: &MedalCounts,
    ) -> Result<Option<MedalCounts>, DatabaseError> {
        let sp = Savepoint::begin(&self.conn, "swap_snapshot")?;
        let previous = read_snapshot(&self.conn, date)?;
        write_snapshot(&self.conn, date, snapshot)?;
        sp.release()?;
        Ok(previous)
    }

    fn load_wallet(&self) -> Result<Option<MedalCounts>, DatabaseError> {
        Ok(read_wallet(&self.conn)?.map(|record| record.totals))
    }

    fn save_wallet(&self, wallet: &MedalCounts) -> Result<(), DatabaseError> {
        write_wallet(&self.conn, wallet)
    }

    fn update_wallet(
        &self,
        adjust: &mut dyn FnMut(&mut MedalCounts) -> Result<(), ValidationError>,
    ) -> Result<MedalCounts> {
        let sp = Savepoint::begin(&self.conn, "update_wallet")?;
        let mut wallet = self.load_wallet()?.unwrap_or_default();
        adjust(&mut wallet)?;
        write_wallet(&self.conn, &wallet)?;
        sp.release()?;
        Ok(wallet)
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let sp = Savepoint::begin(&self.conn, "batch")?;
        let out = f()?;
        sp.release()?;
        Ok(out)
    }
}

impl FocusTimeSource for Database {
    fn sum_focused_seconds(&self, date: NaiveDate) -> Result<i64, DatabaseError> {
        self.sum_focused_seconds_between(date, date)
    }

    fn sum_focused_seconds_between(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, DatabaseError> {
        let ms: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(spent_ms), 0) FROM timers WHERE fixated_on BETWEEN ?1 AND ?2",
            params![day_key(from), day_key(to)],
            |row| row.get(0),
        )?;
        Ok(ms / 1000)
    }

    fn daily_focused_seconds(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, i64>, DatabaseError> {
        let mut out: BTreeMap<NaiveDate, i64> =
            from.iter_days().take_while(|d| *d <= to).map(|d| (d, 0)).collect();

        let mut stmt = self.conn.prepare(
            "SELECT fixated_on, SUM(spent_ms) FROM timers
             WHERE fixated_on BETWEEN ?1 AND ?2
             GROUP BY fixated_on",
        )?;
        let rows = stmt.query_map(params![day_key(from), day_key(to)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (day, ms) = row?;
            out.insert(parse_day("timers", &day)?, ms / 1000);
        }
        Ok(out)
    }
}

/// Rolls back to the savepoint on drop unless released.
struct Savepoint<'c> {
    conn: &'c Connection,
    name: &'static str,
    released: bool,
}

impl<'c> Savepoint<'c> {
    fn begin(conn: &'c Connection, name: &'static str) -> rusqlite::Result<Self> {
        conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(Self {
            conn,
            name,
            released: false,
        })
    }

    fn release(mut self) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!("RELEASE {}", self.name))?;
        self.released = true;
        Ok(())
    }
}

impl Drop for Savepoint<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let sql = format!("ROLLBACK TO {0}; RELEASE {0}", self.name);
        if let Err(e) = self.conn.execute_batch(&sql) {
            tracing::warn!(savepoint = self.name, error = %e, "rollback failed");
        }
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_day(table: &'static str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| DatabaseError::CorruptRow {
        table,
        message: format!("bad date '{raw}': {e}"),
    })
}

fn parse_timestamp(table: &'static str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            table,
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

fn to_count(table: &'static str, medal: Medal, raw: i64) -> Result<u32, DatabaseError> {
    u32::try_from(raw).map_err(|_| DatabaseError::CorruptRow {
        table,
        message: format!("{medal} count {raw} out of range"),
    })
}

fn read_snapshot(conn: &Connection, date: NaiveDate) -> Result<Option<MedalCounts>, DatabaseError> {
    let key = day_key(date);
    let exists = conn
        .query_row("SELECT 1 FROM reward_days WHERE day = ?1", params![key], |_| Ok(()))
        .optional()?
        .is_some();
    if !exists {
        return Ok(None);
    }

    let mut stmt = conn.prepare("SELECT medal, count FROM rewards_daily WHERE day = ?1")?;
    let rows = stmt.query_map(params![key], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = MedalCounts::new();
    for row in rows {
        let (medal, count) = row?;
        let medal: Medal = medal.parse().map_err(|e: ValidationError| DatabaseError::CorruptRow {
            table: "rewards_daily",
            message: e.to_string(),
        })?;
        counts.add(medal, to_count("rewards_daily", medal, count)?);
    }
    Ok(Some(counts))
}

fn write_snapshot(conn: &Connection, date: NaiveDate, snapshot: &MedalCounts) -> Result<(), DatabaseError> {
    let key = day_key(date);
    conn.execute("DELETE FROM rewards_daily WHERE day = ?1", params![key])?;
    conn.execute(
        "INSERT INTO reward_days (day, reconciled_at) VALUES (?1, ?2)
         ON CONFLICT(day) DO UPDATE SET reconciled_at = excluded.reconciled_at",
        params![key, Utc::now().to_rfc3339()],
    )?;

    let mut stmt = conn.prepare_cached("INSERT INTO rewards_daily (day, medal, count) VALUES (?1, ?2, ?3)")?;
    for (medal, count) in snapshot.iter() {
        stmt.execute(params![key, medal.as_str(), count])?;
    }
    Ok(())
}

fn read_wallet(conn: &Connection) -> Result<Option<WalletRecord>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT wood, steel, bronze, silver, gold, revision, updated_at FROM wallet WHERE id = 1",
            [],
            |row| {
                Ok((
                    [
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ],
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((raw_counts, revision, updated_at)) = row else {
        return Ok(None);
    };

    let mut totals = MedalCounts::new();
    for (medal, raw) in Medal::ALL.into_iter().zip(raw_counts) {
        totals.set(medal, to_count("wallet", medal, raw)?);
    }
    Ok(Some(WalletRecord {
        totals,
        revision,
        updated_at: parse_timestamp("wallet", &updated_at)?,
    }))
}

fn write_wallet(conn: &Connection, wallet: &MedalCounts) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO wallet (id, wood, steel, bronze, silver, gold, revision, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, 1, ?6)
         ON CONFLICT(id) DO UPDATE SET
            wood = excluded.wood,
            steel = excluded.steel,
            bronze = excluded.bronze,
            silver = excluded.silver,
            gold = excluded.gold,
            revision = wallet.revision + 1,
            updated_at = excluded.updated_at",
        params![
            wallet.get(Medal::Wood),
            wallet.get(Medal::Steel),
            wallet.get(Medal::Bronze),
            wallet.get(Medal::Silver),
            wallet.get(Medal::Gold),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn timer(date: NaiveDate, minutes: i64, external_id: Option<&str>) -> NewTimer {
        NewTimer {
            external_id: external_id.map(str::to_string),
            name: "Deep work".to_string(),
            description: String::new(),
            fixated_on: date,
            spent_ms: minutes * 60_000,
        }
    }

    #[test]
    fn timers_sum_per_day_and_range() {
        let db = Database::open_memory().unwrap();
        db.save_timer(&timer(day(3), 90, None)).unwrap();
        db.save_timer(&timer(day(3), 60, None)).unwrap();
        db.save_timer(&timer(day(5), 30, None)).unwrap();

        assert_eq!(db.sum_focused_seconds(day(3)).unwrap(), 150 * 60);
        assert_eq!(db.sum_focused_seconds(day(4)).unwrap(), 0);
        assert_eq!(db.sum_focused_seconds_between(day(3), day(5)).unwrap(), 180 * 60);

        let daily = db.daily_focused_seconds(day(3), day(5)).unwrap();
        assert_eq!(daily.values().copied().collect::<Vec<_>>(), vec![9000, 0, 1800]);
        assert_eq!(db.total_focused_seconds().unwrap(), 180 * 60);
    }

    #[test]
    fn timer_with_same_external_id_is_updated() {
        let db = Database::open_memory().unwrap();
        let first = db.save_timer(&timer(day(3), 30, Some("sp:a:2025-03-03"))).unwrap();
        let second = db.save_timer(&timer(day(3), 45, Some("sp:a:2025-03-03"))).unwrap();

        assert_eq!(first, second);
        assert_eq!(db.sum_focused_seconds(day(3)).unwrap(), 45 * 60);
        assert_eq!(db.list_timers(10).unwrap().len(), 1);
    }

    #[test]
    fn empty_timer_is_rejected() {
        let db = Database::open_memory().unwrap();
        assert!(db.save_timer(&timer(day(3), 0, None)).is_err());
    }

    #[test]
    fn list_and_delete_timers() {
        let db = Database::open_memory().unwrap();
        db.save_timer(&timer(day(3), 10, None)).unwrap();
        let newest = db.save_timer(&timer(day(6), 20, None)).unwrap();

        let listed = db.list_timers(1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, newest);
        assert_eq!(listed[0].fixated_on, day(6));

        assert!(db.delete_timer(newest).unwrap());
        assert!(!db.delete_timer(newest).unwrap());
        assert_eq!(db.list_timers(10).unwrap().len(), 1);
    }

    #[test]
    fn snapshot_absent_until_written_even_when_empty() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load_snapshot(day(3)).unwrap(), None);

        db.replace_snapshot(day(3), &MedalCounts::new()).unwrap();
        assert_eq!(db.load_snapshot(day(3)).unwrap(), Some(MedalCounts::new()));
        assert_eq!(db.reconciled_days(day(1), day(31)).unwrap(), vec![day(3)]);
    }

    #[test]
    fn swap_returns_previous_and_replaces_rows() {
        let db = Database::open_memory().unwrap();
        let first: MedalCounts = [(Medal::Wood, 2), (Medal::Gold, 1)].into_iter().collect();
        let second: MedalCounts = [(Medal::Silver, 1)].into_iter().collect();

        assert_eq!(db.swap_snapshot(day(3), &first).unwrap(), None);
        assert_eq!(db.swap_snapshot(day(3), &second).unwrap(), Some(first));
        assert_eq!(db.load_snapshot(day(3)).unwrap(), Some(second));
    }

    #[test]
    fn failed_replace_keeps_previous_snapshot() {
        let db = Database::open_memory().unwrap();
        let before: MedalCounts = [(Medal::Wood, 1)].into_iter().collect();
        db.replace_snapshot(day(3), &before).unwrap();

        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_gold BEFORE INSERT ON rewards_daily
                 WHEN NEW.medal = 'gold'
                 BEGIN SELECT RAISE(ABORT, 'gold rejected'); END;",
            )
            .unwrap();

        // bronze is inserted before gold, then the gold row aborts
        let next: MedalCounts = [(Medal::Bronze, 1), (Medal::Gold, 1)].into_iter().collect();
        assert!(db.swap_snapshot(day(3), &next).is_err());
        assert_eq!(db.load_snapshot(day(3)).unwrap(), Some(before));
    }

    #[test]
    fn wallet_revision_bumps_on_each_write() {
        let db = Database::open_memory().unwrap();
        assert!(db.wallet_record().unwrap().is_none());

        let wallet: MedalCounts = [(Medal::Steel, 3)].into_iter().collect();
        db.save_wallet(&wallet).unwrap();
        db.save_wallet(&wallet).unwrap();

        let record = db.wallet_record().unwrap().unwrap();
        assert_eq!(record.revision, 2);
        assert_eq!(record.totals, wallet);
    }

    #[test]
    fn atomically_rolls_back_everything_on_error() {
        let db = Database::open_memory().unwrap();
        let snapshot: MedalCounts = [(Medal::Gold, 1)].into_iter().collect();

        let result: Result<()> = db.atomically(|| {
            db.replace_snapshot(day(3), &snapshot)?;
            db.save_wallet(&snapshot)?;
            Err(DatabaseError::Locked.into())
        });

        assert!(result.is_err());
        assert_eq!(db.load_snapshot(day(3)).unwrap(), None);
        assert!(db.wallet_record().unwrap().is_none());
    }

    #[test]
    fn atomically_commits_on_success() {
        let db = Database::open_memory().unwrap();
        let snapshot: MedalCounts = [(Medal::Gold, 1)].into_iter().collect();

        db.atomically(|| {
            db.replace_snapshot(day(3), &snapshot)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.load_snapshot(day(3)).unwrap(), Some(snapshot));
    }
}

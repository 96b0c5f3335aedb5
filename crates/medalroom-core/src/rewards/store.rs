//! Storage contracts the reward engine depends on.
//!
//! The engine never talks to SQLite directly; it goes through these traits so
//! the same logic runs against [`crate::Database`] or an in-memory test store.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{DatabaseError, Result, ValidationError};
use crate::medal::MedalCounts;

/// Persistence for per-day snapshots and the wallet.
pub trait RewardStore {
    /// Snapshot recorded for `date`, or `None` if the date was never reconciled.
    fn load_snapshot(&self, date: NaiveDate) -> Result<Option<MedalCounts>, DatabaseError>;

    /// Make `snapshot` the only record for `date`, all-or-nothing.
    fn replace_snapshot(&self, date: NaiveDate, snapshot: &MedalCounts) -> Result<(), DatabaseError>;

    /// Replace the snapshot for `date` and return the one it superseded.
    ///
    /// Implementations backed by a shared store must read and write under one
    /// transaction, otherwise two reconciliations of the same date can both
    /// diff against the same previous snapshot and double count.
    fn swap_snapshot(
        &self,
        date: NaiveDate,
        snapshot: &MedalCounts,
    ) -> Result<Option<MedalCounts>, DatabaseError> {
        let previous = self.load_snapshot(date)?;
        self.replace_snapshot(date, snapshot)?;
        Ok(previous)
    }

    /// Current wallet, or `None` if nothing was ever committed.
    fn load_wallet(&self) -> Result<Option<MedalCounts>, DatabaseError>;

    /// Persist the whole wallet in one write.
    fn save_wallet(&self, wallet: &MedalCounts) -> Result<(), DatabaseError>;

    /// Read-modify-write of the wallet. An absent wallet starts at zero.
    ///
    /// If `adjust` fails nothing is written.
    fn update_wallet(
        &self,
        adjust: &mut dyn FnMut(&mut MedalCounts) -> Result<(), ValidationError>,
    ) -> Result<MedalCounts> {
        let mut wallet = self.load_wallet()?.unwrap_or_default();
        adjust(&mut wallet)?;
        self.save_wallet(&wallet)?;
        Ok(wallet)
    }

    /// Run `f` as one unit of work. Stores with transactions override this
    /// so everything `f` writes is rolled back when it returns an error.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce() -> Result<T>,
    {
        f()
    }
}

/// Read access to recorded focus time.
pub trait FocusTimeSource {
    /// Focused seconds recorded on `date`.
    fn sum_focused_seconds(&self, date: NaiveDate) -> Result<i64, DatabaseError>;

    /// Focused seconds recorded from `from` to `to`, both inclusive.
    fn sum_focused_seconds_between(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, DatabaseError>;

    /// Focused seconds per day from `from` to `to`. Days without records are 0.
    fn daily_focused_seconds(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, i64>, DatabaseError> {
        let mut out = BTreeMap::new();
        for date in from.iter_days().take_while(|d| *d <= to) {
            out.insert(date, self.sum_focused_seconds(date)?);
        }
        Ok(out)
    }
}

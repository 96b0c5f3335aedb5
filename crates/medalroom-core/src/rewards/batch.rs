//! Reconciliation of a date range.
//!
//! Runs in two phases. Phase one reconciles every date and collects its delta
//! without touching the wallet. Phase two sums the deltas and commits them with
//! a single wallet write. Dates whose weekday has no day type are skipped.
//! Any other failure aborts the batch before the wallet is written, and the
//! store's [`atomically`](RewardStore::atomically) scope rolls back the
//! snapshots already swapped.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::aggregator::focus_minutes;
use super::reconciler::{DailyLedger, DayReconciliation};
use super::store::{FocusTimeSource, RewardStore};
use super::wallet::{WalletAccumulator, WalletCommit};
use crate::error::{CoreError, Result, ValidationError};
use crate::goals::Calendar;
use crate::medal::MedalDelta;

/// What happened to one date of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayOutcome {
    Reconciled {
        day_type: String,
        #[serde(flatten)]
        result: DayReconciliation,
    },
    Skipped {
        date: NaiveDate,
        weekday: Weekday,
    },
}

impl DayOutcome {
    pub fn date(&self) -> NaiveDate {
        match self {
            DayOutcome::Reconciled { result, .. } => result.date,
            DayOutcome::Skipped { date, .. } => *date,
        }
    }

    pub fn delta(&self) -> Option<&MedalDelta> {
        match self {
            DayOutcome::Reconciled { result, .. } => Some(&result.delta),
            DayOutcome::Skipped { .. } => None,
        }
    }
}

/// Phase-one accumulator: per-date outcomes, nothing committed yet.
#[derive(Debug, Default)]
pub struct RewardBatch {
    days: Vec<DayOutcome>,
}

impl RewardBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: DayOutcome) {
        self.days.push(outcome);
    }

    pub fn days(&self) -> &[DayOutcome] {
        &self.days
    }

    /// Phase two: apply the sum of all collected deltas in one write.
    pub fn commit<S: RewardStore + ?Sized>(self, store: &S) -> Result<BatchReport> {
        let commit = WalletAccumulator::new(store).apply(self.days.iter().filter_map(DayOutcome::delta))?;
        Ok(BatchReport {
            days: self.days,
            wallet: commit,
        })
    }
}

/// Result of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub days: Vec<DayOutcome>,
    pub wallet: WalletCommit,
}

impl BatchReport {
    pub fn reconciled(&self) -> impl Iterator<Item = &DayReconciliation> {
        self.days.iter().filter_map(|day| match day {
            DayOutcome::Reconciled { result, .. } => Some(result),
            DayOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.days
            .iter()
            .filter(|day| matches!(day, DayOutcome::Skipped { .. }))
            .count()
    }
}

/// Reconcile every date from `from` to `to` (inclusive) and commit the
/// aggregate wallet change once.
///
/// # Errors
/// Returns [`ValidationError::InvalidDateRange`] for an inverted range and
/// [`CoreError::DateFailed`] naming the first date that failed; in that case
/// the wallet was not written.
pub fn reconcile_range<S, T>(
    store: &S,
    source: &T,
    calendar: &Calendar,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BatchReport>
where
    S: RewardStore,
    T: FocusTimeSource + ?Sized,
{
    if to < from {
        return Err(ValidationError::InvalidDateRange { start: from, end: to }.into());
    }

    store.atomically(|| {
        let ledger = DailyLedger::new(store);
        let mut batch = RewardBatch::new();

        for date in from.iter_days().take_while(|d| *d <= to) {
            let day_type = match calendar.day_type_for(date) {
                Ok(day_type) => day_type,
                Err(CoreError::ConfigurationMissing { date, weekday }) => {
                    tracing::info!(%date, %weekday, "skipped, no day type configured");
                    batch.push(DayOutcome::Skipped { date, weekday });
                    continue;
                }
                Err(other) => return Err(other.for_date(date)),
            };

            let result = focus_minutes(source, date)
                .and_then(|minutes| ledger.reconcile(date, minutes, &day_type.focus_goals))
                .map_err(|err| err.for_date(date))?;

            batch.push(DayOutcome::Reconciled {
                day_type: day_type.name.clone(),
                result,
            });
        }

        batch.commit(store)
    })
}

/// Reconcile a single date and commit its delta.
///
/// A date without a day type is reported as skipped, not as an error.
pub fn reconcile_day<S, T>(store: &S, source: &T, calendar: &Calendar, date: NaiveDate) -> Result<BatchReport>
where
    S: RewardStore,
    T: FocusTimeSource + ?Sized,
{
    reconcile_range(store, source, calendar, date, date)
}

//! Daily ledger reconciliation.
//!
//! Re-evaluates one date, swaps its stored snapshot for the new one, and
//! reports how the earned medals changed. Running it again with the same
//! inputs changes nothing and yields an empty delta.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::evaluator::evaluate;
use super::store::RewardStore;
use crate::error::Result;
use crate::goals::FocusGoal;
use crate::medal::{MedalCounts, MedalDelta};

/// Outcome of reconciling one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReconciliation {
    pub date: NaiveDate,
    pub minutes: u32,
    /// Snapshot now stored for the date.
    pub snapshot: MedalCounts,
    /// Snapshot it replaced (empty if the date was never reconciled).
    pub previous: MedalCounts,
    /// `snapshot - previous`, zero entries omitted.
    pub delta: MedalDelta,
}

impl DayReconciliation {
    pub fn changed(&self) -> bool {
        !self.delta.is_zero()
    }
}

/// Reconciles per-date snapshots against a [`RewardStore`].
///
/// Never touches the wallet; pair it with
/// [`WalletAccumulator`](super::wallet::WalletAccumulator) to commit deltas.
#[derive(Debug)]
pub struct DailyLedger<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: RewardStore + ?Sized> DailyLedger<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Evaluate `minutes` against `goals`, store the result as the snapshot
    /// for `date`, and return the change from the previous snapshot.
    ///
    /// # Errors
    /// Propagates store failures. The store guarantees the previous snapshot
    /// survives intact when the swap fails.
    pub fn reconcile(&self, date: NaiveDate, minutes: u32, goals: &[FocusGoal]) -> Result<DayReconciliation> {
        let snapshot = evaluate(minutes, goals);
        let previous = self.store.swap_snapshot(date, &snapshot)?.unwrap_or_default();
        let delta = snapshot.delta_from(&previous);

        tracing::debug!(%date, minutes, earned = %snapshot, change = %delta, "reconciled day");

        Ok(DayReconciliation {
            date,
            minutes,
            snapshot,
            previous,
            delta,
        })
    }
}

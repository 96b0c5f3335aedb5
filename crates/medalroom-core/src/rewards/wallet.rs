//! Commits reconciliation deltas to the wallet.

use serde::{Deserialize, Serialize};

use super::store::RewardStore;
use crate::error::Result;
use crate::medal::{MedalCounts, MedalDelta};

/// What a call to [`WalletAccumulator::apply`] committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCommit {
    /// Aggregate of all deltas in the batch.
    pub adjustment: MedalDelta,
    /// Wallet after the write; `None` when the adjustment was zero and the
    /// store was not touched.
    pub totals: Option<MedalCounts>,
}

impl WalletCommit {
    pub fn is_noop(&self) -> bool {
        self.totals.is_none()
    }
}

/// Sums per-date deltas and applies them to the wallet in a single write.
///
/// Call `apply` once per batch, after every date in it was reconciled.
#[derive(Debug)]
pub struct WalletAccumulator<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: RewardStore + ?Sized> WalletAccumulator<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Apply the element-wise sum of `deltas`.
    ///
    /// An all-zero sum performs no store access at all.
    ///
    /// # Errors
    /// Fails without writing if the store fails or if a medal would drop
    /// below zero.
    pub fn apply<'d, I>(&self, deltas: I) -> Result<WalletCommit>
    where
        I: IntoIterator<Item = &'d MedalDelta>,
    {
        let adjustment: MedalDelta = deltas.into_iter().collect();
        if adjustment.is_zero() {
            tracing::debug!("wallet unchanged, skipping write");
            return Ok(WalletCommit {
                adjustment,
                totals: None,
            });
        }

        let totals = self
            .store
            .update_wallet(&mut |wallet: &mut MedalCounts| wallet.apply(&adjustment))?;

        tracing::info!(change = %adjustment, wallet = %totals, "wallet updated");
        Ok(WalletCommit {
            adjustment,
            totals: Some(totals),
        })
    }
}

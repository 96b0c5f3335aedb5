//! Reward computation and reconciliation engine.
//!
//! - [`evaluate`]: minutes focused + goals -> medals earned
//! - [`DailyLedger`]: per-date snapshot swap and delta
//! - [`WalletAccumulator`]: one wallet write per batch
//! - [`compute_display`]: per-goal progress and nearest rest time
//! - [`reconcile_range`]: the two-phase batch tying them together

mod aggregator;
mod batch;
mod evaluator;
mod progress;
mod reconciler;
mod store;
mod wallet;

pub use aggregator::{focus_minutes, focus_minutes_between, minutes_from_seconds};
pub use batch::{reconcile_day, reconcile_range, BatchReport, DayOutcome, RewardBatch};
pub use evaluator::evaluate;
pub use progress::{compute_display, progress_ratio, GoalProgress, RestDisplay};
pub use reconciler::{DailyLedger, DayReconciliation};
pub use store::{FocusTimeSource, RewardStore};
pub use wallet::{WalletAccumulator, WalletCommit};

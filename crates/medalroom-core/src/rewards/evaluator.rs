//! Turns focused minutes into earned medals.

use crate::goals::FocusGoal;
use crate::medal::MedalCounts;

/// Medals earned by `minutes` of focus against `goals`.
///
/// Every goal whose threshold is at or below `minutes` contributes its reward;
/// goals sharing a medal accumulate. Goal order is irrelevant.
pub fn evaluate(minutes: u32, goals: &[FocusGoal]) -> MedalCounts {
    goals
        .iter()
        .filter(|goal| goal.is_met_by(minutes))
        .map(|goal| (goal.medal, goal.reward_count))
        .collect()
}

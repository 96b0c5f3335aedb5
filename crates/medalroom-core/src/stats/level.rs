//! Experience levels.

use serde::{Deserialize, Serialize};

/// A named rank reached once total focused minutes meet the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub level: u32,
    pub name: String,
    pub threshold_minutes: u64,
}

impl Level {
    /// Minutes still missing to reach this level.
    pub fn remaining(&self, total_minutes: u64) -> u64 {
        self.threshold_minutes.saturating_sub(total_minutes)
    }
}

/// Highest level whose threshold is at or below `total_minutes`.
///
/// `levels` may be in any order.
pub fn current_level(levels: &[Level], total_minutes: u64) -> Option<&Level> {
    levels
        .iter()
        .filter(|l| l.threshold_minutes <= total_minutes)
        .max_by_key(|l| (l.threshold_minutes, l.level))
}

/// Lowest level not reached yet.
pub fn next_level(levels: &[Level], total_minutes: u64) -> Option<&Level> {
    levels
        .iter()
        .filter(|l| l.threshold_minutes > total_minutes)
        .min_by_key(|l| (l.threshold_minutes, l.level))
}

//! Focus goals, day types, and the weekday calendar that selects them.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::medal::Medal;

/// A single reward rule: focus at least `threshold_minutes` to earn
/// `reward_count` x `medal` and unlock rest from `rest_unlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusGoal {
    pub threshold_minutes: u32,
    pub medal: Medal,
    pub reward_count: u32,
    pub rest_unlock: NaiveTime,
}

impl FocusGoal {
    pub fn new(threshold_minutes: u32, medal: Medal, reward_count: u32, rest_unlock: NaiveTime) -> Self {
        Self {
            threshold_minutes,
            medal,
            reward_count,
            rest_unlock,
        }
    }

    /// Whether `minutes` of focus satisfies this goal.
    pub fn is_met_by(&self, minutes: u32) -> bool {
        self.threshold_minutes <= minutes
    }
}

/// Copy of `goals` ordered by rest-unlock time, earliest first.
///
/// Ties fall back to threshold, then medal, then reward count, so the order
/// never depends on how the goals were listed in the config.
pub fn sorted_by_rest_unlock(goals: &[FocusGoal]) -> Vec<FocusGoal> {
    let mut sorted = goals.to_vec();
    sorted.sort_by(|a, b| {
        a.rest_unlock
            .cmp(&b.rest_unlock)
            .then(a.threshold_minutes.cmp(&b.threshold_minutes))
            .then(a.medal.cmp(&b.medal))
            .then(a.reward_count.cmp(&b.reward_count))
    });
    sorted
}

/// Named bundle of focus goals applied to a weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayType {
    pub name: String,
    pub focus_goals: Vec<FocusGoal>,
}

/// Weekday to day type resolution.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    days: HashMap<Weekday, DayType>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, weekday: Weekday, day_type: DayType) -> Self {
        self.insert(weekday, day_type);
        self
    }

    pub fn insert(&mut self, weekday: Weekday, day_type: DayType) {
        self.days.insert(weekday, day_type);
    }

    pub fn get(&self, weekday: Weekday) -> Option<&DayType> {
        self.days.get(&weekday)
    }

    /// Day type for `date`.
    ///
    /// # Errors
    /// Returns [`CoreError::ConfigurationMissing`] when the weekday is unmapped.
    pub fn day_type_for(&self, date: NaiveDate) -> Result<&DayType> {
        let weekday = date.weekday();
        self.days
            .get(&weekday)
            .ok_or(CoreError::ConfigurationMissing { date, weekday })
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

//! Per-day focus history and day status.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::medal::MedalCounts;
use crate::rewards::{compute_display, evaluate, focus_minutes, minutes_from_seconds, FocusTimeSource, RestDisplay};
use crate::storage::RewardSettings;

/// Focused minutes on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMinutes {
    pub date: NaiveDate,
    pub minutes: u32,
}

/// Where a date stands against its day type's goals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatus {
    pub date: NaiveDate,
    /// `None` when the weekday has no day type.
    pub day_type: Option<String>,
    /// Medals the current minutes would earn.
    pub earned: MedalCounts,
    pub display: RestDisplay,
    pub can_rest: bool,
}

/// Minutes per day for the `days` days ending at `today`, oldest first.
/// Days without timers read zero.
pub fn daily_history<T: FocusTimeSource + ?Sized>(
    source: &T,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DailyMinutes>> {
    if days == 0 {
        return Ok(Vec::new());
    }
    let from = today
        .checked_sub_signed(Duration::days(i64::from(days) - 1))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "days".into(),
            message: format!("{days} days before {today} is out of range"),
        })?;

    let mut history = Vec::new();
    for (date, seconds) in source.daily_focused_seconds(from, today)? {
        history.push(DailyMinutes {
            date,
            minutes: minutes_from_seconds(seconds)?,
        });
    }
    Ok(history)
}

/// Progress and rest time for `date` as seen at wall-clock `now`.
///
/// A weekday without a day type has no goals, so rest opens at the fallback
/// time.
pub fn day_status<T: FocusTimeSource + ?Sized>(
    source: &T,
    settings: &RewardSettings,
    date: NaiveDate,
    now: NaiveTime,
) -> Result<DayStatus> {
    let minutes = focus_minutes(source, date)?;
    let day_type = settings.calendar.get(date.weekday());
    let goals = day_type.map(|d| d.focus_goals.as_slice()).unwrap_or_default();

    let display = compute_display(minutes, goals, settings.fallback_rest);
    Ok(DayStatus {
        date,
        day_type: day_type.map(|d| d.name.clone()),
        earned: evaluate(minutes, goals),
        can_rest: display.can_rest_at(now),
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::goals::{Calendar, DayType, FocusGoal};
    use crate::medal::Medal;
    use crate::rewards::testing::MemoryStore;
    use chrono::Weekday;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn settings() -> RewardSettings {
        let workday = DayType {
            name: "workday".into(),
            focus_goals: vec![
                FocusGoal::new(150, Medal::Bronze, 1, at(18, 0)),
                FocusGoal::new(240, Medal::Silver, 1, at(17, 0)),
            ],
        };
        RewardSettings {
            calendar: Calendar::new().with_day(Weekday::Mon, workday),
            fallback_rest: at(22, 0),
            levels: Vec::new(),
        }
    }

    #[test]
    fn history_is_zero_filled_oldest_first() {
        let store = MemoryStore::default();
        store.set_minutes(day(3), 90);
        store.set_minutes(day(5), 30);

        let history = daily_history(&store, day(5), 4).unwrap();
        let minutes: Vec<u32> = history.iter().map(|d| d.minutes).collect();
        assert_eq!(history[0].date, day(2));
        assert_eq!(minutes, vec![0, 90, 0, 30]);
        assert!(daily_history(&store, day(5), 0).unwrap().is_empty());
    }

    #[test]
    fn history_reaching_before_the_calendar_is_rejected() {
        let store = MemoryStore::default();
        let err = daily_history(&store, day(3), 200_000_000).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidValue { ref field, .. }) if field == "days"
        ));
    }

    #[test]
    fn status_of_configured_day() {
        let store = MemoryStore::default();
        store.set_minutes(day(3), 195);

        let status = day_status(&store, &settings(), day(3), at(17, 45)).unwrap();
        assert_eq!(status.day_type.as_deref(), Some("workday"));
        assert_eq!(status.earned.get(Medal::Bronze), 1);
        assert_eq!(status.display.nearest_rest, at(17, 30));
        assert!(status.can_rest);
    }

    #[test]
    fn status_of_unmapped_day_uses_fallback() {
        let store = MemoryStore::default();
        store.set_minutes(day(4), 500);

        let status = day_status(&store, &settings(), day(4), at(21, 0)).unwrap();
        assert!(status.day_type.is_none());
        assert!(status.earned.is_empty());
        assert_eq!(status.display.nearest_rest, at(22, 0));
        assert!(!status.can_rest);
    }
}

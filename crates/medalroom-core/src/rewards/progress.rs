//! Live progress toward each goal and the nearest time rest is allowed.
//!
//! Goals are ordered by rest-unlock time, earliest first, so a later index is
//! an easier goal with a later rest time. Reaching a goal pulls the rest time
//! to that goal's unlock time; minutes beyond it creep the rest time toward the
//! next harder goal (the one just before it in that order) proportionally.
//!
//! Interpolation only happens when the reached goal has a harder neighbour,
//! i.e. its index is above zero. Reaching the hardest goal pins the rest time
//! to its unlock time exactly.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::goals::{sorted_by_rest_unlock, FocusGoal};

/// Progress toward a single goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: FocusGoal,
    /// `minutes / threshold`, unbounded above. A zero threshold reads 1.0.
    pub ratio: f64,
    pub reached: bool,
}

/// Everything a status view needs for one moment in the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestDisplay {
    pub minutes: u32,
    /// Per-goal progress, sorted by rest-unlock time.
    pub goals: Vec<GoalProgress>,
    pub nearest_rest: NaiveTime,
    /// Index into `goals` of the goal whose unlock time was adopted.
    pub reached_goal: Option<usize>,
    /// Whether `nearest_rest` was pulled toward the next harder goal.
    pub interpolated: bool,
}

impl RestDisplay {
    /// Whether rest is allowed at wall-clock time `now`.
    pub fn can_rest_at(&self, now: NaiveTime) -> bool {
        now >= self.nearest_rest
    }
}

/// Completion ratio for `goal` at `minutes`.
pub fn progress_ratio(minutes: u32, goal: &FocusGoal) -> f64 {
    if goal.threshold_minutes == 0 {
        return 1.0;
    }
    f64::from(minutes) / f64::from(goal.threshold_minutes)
}

/// Per-goal progress and the nearest rest time for `minutes` of focus.
///
/// `fallback_rest` is the time rest is allowed regardless of goals; no goal
/// can push the rest time later than it.
pub fn compute_display(minutes: u32, goals: &[FocusGoal], fallback_rest: NaiveTime) -> RestDisplay {
    let sorted = sorted_by_rest_unlock(goals);
    let progress: Vec<GoalProgress> = sorted
        .iter()
        .map(|goal| GoalProgress {
            goal: *goal,
            ratio: progress_ratio(minutes, goal),
            reached: goal.is_met_by(minutes),
        })
        .collect();

    let mut nearest_rest = fallback_rest;
    let mut reached_goal = None;
    for (idx, entry) in progress.iter().enumerate() {
        if entry.reached && entry.goal.rest_unlock < nearest_rest {
            nearest_rest = entry.goal.rest_unlock;
            reached_goal = Some(idx);
        }
    }

    let mut interpolated = false;
    if let Some(idx) = reached_goal.filter(|&idx| idx > 0) {
        if let Some(shifted) = interpolate(minutes, &sorted[idx], &sorted[idx - 1]) {
            interpolated = shifted != nearest_rest;
            nearest_rest = shifted;
        }
    }

    RestDisplay {
        minutes,
        goals: progress,
        nearest_rest,
        reached_goal,
        interpolated,
    }
}

/// Rest time between `reached` and the harder goal `next`, proportional to
/// how far `minutes` has progressed from one threshold to the other.
fn interpolate(minutes: u32, reached: &FocusGoal, next: &FocusGoal) -> Option<NaiveTime> {
    let minute_span = i64::from(next.threshold_minutes) - i64::from(reached.threshold_minutes);
    if minute_span <= 0 {
        return None;
    }
    let overshoot = i64::from(minutes) - i64::from(reached.threshold_minutes);
    let fraction = (overshoot as f64 / minute_span as f64).clamp(0.0, 1.0);

    let time_span = next.rest_unlock.signed_duration_since(reached.rest_unlock);
    let shift_ms = (time_span.num_milliseconds() as f64 * fraction).round() as i64;
    let shifted = reached.rest_unlock + Duration::milliseconds(shift_ms);

    // `next` never unlocks later than `reached`, so it bounds the shift.
    Some(shifted.max(next.rest_unlock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medal::Medal;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn fallback() -> NaiveTime {
        at(22, 0)
    }

    fn bronze_silver() -> Vec<FocusGoal> {
        vec![
            FocusGoal::new(150, Medal::Bronze, 1, at(18, 0)),
            FocusGoal::new(240, Medal::Silver, 1, at(17, 0)),
        ]
    }

    #[test]
    fn nothing_reached_keeps_fallback() {
        let display = compute_display(100, &bronze_silver(), fallback());
        assert_eq!(display.nearest_rest, fallback());
        assert_eq!(display.reached_goal, None);
        assert!(!display.interpolated);
    }

    #[test]
    fn goals_are_reported_in_rest_time_order() {
        let display = compute_display(0, &bronze_silver(), fallback());
        let order: Vec<Medal> = display.goals.iter().map(|p| p.goal.medal).collect();
        assert_eq!(order, vec![Medal::Silver, Medal::Bronze]);
    }

    #[test]
    fn exact_threshold_reaches_goal_without_shift() {
        let display = compute_display(150, &bronze_silver(), fallback());
        let bronze = &display.goals[1];
        assert_eq!(bronze.ratio, 1.0);
        assert!(bronze.reached);
        assert_eq!(display.nearest_rest, at(18, 0));
        assert_eq!(display.reached_goal, Some(1));
    }

    #[test]
    fn halfway_to_next_goal_moves_rest_halfway() {
        let display = compute_display(195, &bronze_silver(), fallback());
        assert_eq!(display.nearest_rest, at(17, 30));
        assert!(display.interpolated);
    }

    #[test]
    fn reaching_hardest_goal_pins_its_time() {
        let display = compute_display(400, &bronze_silver(), fallback());
        assert_eq!(display.reached_goal, Some(0));
        assert_eq!(display.nearest_rest, at(17, 0));
        assert!(!display.interpolated);
    }

    #[test]
    fn ratio_is_unbounded_and_zero_threshold_reads_one() {
        let goal = FocusGoal::new(100, Medal::Wood, 1, at(20, 0));
        assert_eq!(progress_ratio(250, &goal), 2.5);
        let free = FocusGoal::new(0, Medal::Wood, 1, at(20, 0));
        assert_eq!(progress_ratio(0, &free), 1.0);
        assert_eq!(progress_ratio(500, &free), 1.0);
    }

    #[test]
    fn goals_later_than_fallback_are_ignored() {
        let goals = vec![FocusGoal::new(60, Medal::Wood, 1, at(23, 0))];
        let display = compute_display(90, &goals, fallback());
        assert_eq!(display.nearest_rest, fallback());
        assert_eq!(display.reached_goal, None);
    }

    #[test]
    fn three_goals_interpolate_between_bracketing_pair() {
        let goals = vec![
            FocusGoal::new(60, Medal::Wood, 1, at(20, 0)),
            FocusGoal::new(120, Medal::Steel, 1, at(19, 0)),
            FocusGoal::new(240, Medal::Gold, 1, at(16, 0)),
        ];
        // Past steel (120), a quarter of the way to gold (240): 19:00 - 45min.
        let display = compute_display(150, &goals, fallback());
        assert_eq!(display.nearest_rest, at(18, 15));
    }

    #[test]
    fn equal_thresholds_do_not_interpolate() {
        let goals = vec![
            FocusGoal::new(120, Medal::Steel, 1, at(18, 0)),
            FocusGoal::new(120, Medal::Gold, 1, at(17, 0)),
        ];
        // Both reached; the earlier one wins and sits at index 0.
        let display = compute_display(120, &goals, fallback());
        assert_eq!(display.nearest_rest, at(17, 0));

        let goals = vec![
            FocusGoal::new(120, Medal::Steel, 1, at(18, 0)),
            FocusGoal::new(90, Medal::Gold, 1, at(17, 0)),
        ];
        let display = compute_display(100, &goals, fallback());
        assert_eq!(display.nearest_rest, at(17, 0));
    }

    #[test]
    fn can_rest_compares_wall_clock() {
        let display = compute_display(195, &bronze_silver(), fallback());
        assert!(!display.can_rest_at(at(17, 29)));
        assert!(display.can_rest_at(at(17, 30)));
    }

    #[test]
    fn empty_catalog_uses_fallback() {
        let display = compute_display(500, &[], fallback());
        assert!(display.goals.is_empty());
        assert_eq!(display.nearest_rest, fallback());
    }
}

//! Statistics for medalroom
//!
//! Focus levels unlocked by total focused time, per-day history, and the
//! status of a single day (goal progress and rest time).

mod daily;
mod level;

pub use daily::{daily_history, day_status, DailyMinutes, DayStatus};
pub use level::{current_level, next_level, Level};

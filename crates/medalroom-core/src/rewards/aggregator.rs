//! Converts recorded focus seconds into whole minutes.

use chrono::NaiveDate;

use super::store::FocusTimeSource;
use crate::error::{Result, ValidationError};

/// Whole minutes in `seconds`; leftover seconds are dropped.
///
/// # Errors
/// Negative input is rejected before any evaluation happens.
pub fn minutes_from_seconds(seconds: i64) -> Result<u32, ValidationError> {
    if seconds < 0 {
        return Err(ValidationError::Negative {
            field: "focused_seconds".to_string(),
            value: seconds,
        });
    }
    u32::try_from(seconds / 60).map_err(|_| ValidationError::InvalidValue {
        field: "focused_seconds".to_string(),
        message: format!("{seconds}s is out of range"),
    })
}

/// Focused minutes recorded on `date`.
pub fn focus_minutes<T: FocusTimeSource + ?Sized>(source: &T, date: NaiveDate) -> Result<u32> {
    let seconds = source.sum_focused_seconds(date)?;
    Ok(minutes_from_seconds(seconds)?)
}

/// Focused minutes recorded from `from` to `to`, both inclusive.
pub fn focus_minutes_between<T: FocusTimeSource + ?Sized>(
    source: &T,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<u32> {
    if to < from {
        return Err(ValidationError::InvalidDateRange { start: from, end: to }.into());
    }
    let seconds = source.sum_focused_seconds_between(from, to)?;
    Ok(minutes_from_seconds(seconds)?)
}

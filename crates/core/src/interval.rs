//! Validation shared by everything that records or measures a time span.

use chrono::{NaiveDateTime, Timelike};
use crate::error::{Error, Result};

/// Truncate an instant to whole minutes.
pub fn normalize(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// Normalize both ends and check the span is measurable: the end comes
/// after the start and both fall on the same civil day.
pub fn validate_interval(start: NaiveDateTime, end: NaiveDateTime) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (start, end) = (normalize(start), normalize(end));
    if end <= start {
        return Err(Error::invalid_interval(format!("end {} is not after start {}", end, start)));
    }
    if end.date() != start.date() {
        return Err(Error::invalid_interval(format!(
            "interval {} - {} crosses midnight",
            start, end
        )));
    }
    Ok((start, end))
}

//! Work-hour duration of a single-day interval.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, Utc};
use pmo_core::{validate_interval, Result, TimeLogEntry, WorkSchedule};
use tracing::debug;

pub use pmo_core::normalize;

/// Work hours between `start` and `end`, excluding the midday break.
///
/// Both instants are local civil time on the same day. A weekday the
/// schedule has no windows for yields `0.0`.
pub fn compute_hours(start: NaiveDateTime, end: NaiveDateTime, schedule: &WorkSchedule) -> Result<f64> {
    let (start, end) = validate_interval(start, end)?;

    let Some(day) = schedule.day(start.weekday()) else {
        debug!(schedule = %schedule.name, weekday = %start.weekday(), "no work windows, counting zero hours");
        return Ok(0.0);
    };

    let date = start.date();
    let break_start = date.and_time(day.break_start());
    // An afternoon opening before the morning closes leaves no break.
    let break_end = date.and_time(day.break_end()).max(break_start);

    let before_break = non_negative(end.min(break_start) - start);
    let after_break = non_negative(end - start.max(break_end));
    Ok(hours(before_break) + hours(after_break))
}

/// Same as [`compute_hours`] for UTC instants, shifted into the schedule's
/// civil time first.
pub fn compute_hours_utc(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    offset: FixedOffset,
    schedule: &WorkSchedule,
) -> Result<f64> {
    compute_hours(
        start.with_timezone(&offset).naive_local(),
        end.with_timezone(&offset).naive_local(),
        schedule,
    )
}

/// Hours of a time log; a running log has none yet.
pub fn log_hours(log: &TimeLogEntry, schedule: &WorkSchedule) -> Result<f64> {
    match log.end {
        Some(end) => compute_hours(log.start, end, schedule),
        None => Ok(0.0),
    }
}

fn non_negative(span: Duration) -> Duration {
    span.max(Duration::zero())
}

fn hours(span: Duration) -> f64 {
    span.num_minutes() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Timelike, Weekday};
    use pmo_core::{DaySchedule, Error, WorkItemId, WorkWindow};

    // 2024-03-04 is a Monday.
    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn schedule() -> WorkSchedule {
        WorkSchedule::office_hours()
    }

    #[test]
    fn test_morning_only() {
        assert_eq!(compute_hours(at(9, 0), at(11, 0), &schedule()).unwrap(), 2.0);
    }

    #[test]
    fn test_spanning_break() {
        assert_eq!(compute_hours(at(9, 0), at(14, 0), &schedule()).unwrap(), 4.0);
    }

    #[test]
    fn test_start_inside_break() {
        assert_eq!(compute_hours(at(12, 30), at(13, 30), &schedule()).unwrap(), 0.5);
    }

    #[test]
    fn test_afternoon_only() {
        assert_eq!(compute_hours(at(13, 30), at(16, 0), &schedule()).unwrap(), 2.5);
    }

    #[test]
    fn test_end_inside_break_stops_at_break() {
        assert_eq!(compute_hours(at(11, 0), at(12, 30), &schedule()).unwrap(), 1.0);
        assert_eq!(compute_hours(at(12, 10), at(12, 40), &schedule()).unwrap(), 0.0);
    }

    #[test]
    fn test_outside_windows_counts_raw_time() {
        assert_eq!(compute_hours(at(18, 0), at(20, 15), &schedule()).unwrap(), 2.25);
    }

    #[test]
    fn test_monotonic_in_end() {
        let schedule = schedule();
        let start = at(9, 0);
        let mut previous = 0.0;
        for minutes in (1..(14 * 60)).step_by(5) {
            let end = start + Duration::minutes(minutes);
            if end.date() != start.date() {
                break;
            }
            let hours = compute_hours(start, end, &schedule).unwrap();
            assert!(hours >= previous, "{} < {} at {}", hours, previous, end);
            previous = hours;
        }
    }

    #[test]
    fn test_weekday_without_windows_is_zero() {
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let hours = compute_hours(
            saturday.and_hms_opt(9, 0, 0).unwrap(),
            saturday.and_hms_opt(12, 0, 0).unwrap(),
            &schedule(),
        )
        .unwrap();
        assert_eq!(hours, 0.0);
    }

    #[test]
    fn test_rejects_reversed_interval() {
        assert!(matches!(
            compute_hours(at(11, 0), at(9, 0), &schedule()),
            Err(Error::InvalidInterval { .. })
        ));
        assert!(compute_hours(at(9, 0), at(9, 0), &schedule()).is_err());
    }

    #[test]
    fn test_rejects_cross_midnight() {
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(1, 0, 0).unwrap();
        assert!(matches!(
            compute_hours(at(22, 0), next_day, &schedule()),
            Err(Error::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_seconds_are_truncated() {
        let start = at(9, 0).with_second(59).unwrap();
        let end = at(10, 0).with_second(30).unwrap();
        assert_eq!(compute_hours(start, end, &schedule()).unwrap(), 1.0);
    }

    #[test]
    fn test_custom_break_with_minutes() {
        let day = DaySchedule {
            morning: WorkWindow {
                from: chrono::NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
                to: chrono::NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            },
            afternoon: WorkWindow::hours(12, 16).unwrap(),
        };
        let schedule = WorkSchedule::new("short lunch").with_day(Weekday::Mon, day);
        assert_eq!(compute_hours(at(10, 0), at(13, 0), &schedule).unwrap(), 2.5);
    }

    #[test]
    fn test_utc_instants_are_shifted() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        // 02:00Z and 07:00Z are 09:00 and 14:00 at UTC+7.
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 2, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap();
        assert_eq!(compute_hours_utc(start, end, offset, &schedule()).unwrap(), 4.0);
    }

    #[test]
    fn test_log_hours_open_log() {
        let open = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        assert_eq!(log_hours(&open, &schedule()).unwrap(), 0.0);
        let closed = TimeLogEntry::closed(WorkItemId::new(), at(9, 0), at(14, 0));
        assert_eq!(log_hours(&closed, &schedule()).unwrap(), 4.0);
    }
}

//! Weekly work schedule - reference data for the duration calculator.

use std::collections::HashMap;
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// One half of a working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    /// Window opens
    pub from: NaiveTime,
    /// Window closes
    pub to: NaiveTime,
}

impl WorkWindow {
    /// Window on whole hours; `None` if an hour is out of range.
    pub fn hours(from: u32, to: u32) -> Option<Self> {
        Some(Self {
            from: NaiveTime::from_hms_opt(from, 0, 0)?,
            to: NaiveTime::from_hms_opt(to, 0, 0)?,
        })
    }
}

/// Morning and afternoon windows around the midday break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Window before the break
    pub morning: WorkWindow,
    /// Window after the break
    pub afternoon: WorkWindow,
}

impl DaySchedule {
    /// Break starts when the morning window closes.
    pub fn break_start(&self) -> NaiveTime {
        self.morning.to
    }

    /// Break ends when the afternoon window opens.
    pub fn break_end(&self) -> NaiveTime {
        self.afternoon.from
    }
}

/// Per-weekday work windows. Weekdays without an entry have no work hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSchedule {
    /// Calendar name
    pub name: String,

    days: HashMap<Weekday, DaySchedule>,
}

impl WorkSchedule {
    /// Empty schedule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            days: HashMap::new(),
        }
    }

    /// Monday to Friday with the same windows every day.
    pub fn weekdays(name: impl Into<String>, day: DaySchedule) -> Self {
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .into_iter()
            .fold(Self::new(name), |schedule, weekday| schedule.with_day(weekday, day))
    }

    /// Office hours 08-12 / 13-17, Monday to Friday.
    pub fn office_hours() -> Self {
        let day = DaySchedule {
            morning: WorkWindow { from: hour(8), to: hour(12) },
            afternoon: WorkWindow { from: hour(13), to: hour(17) },
        };
        Self::weekdays("office", day)
    }

    /// Set the windows for one weekday.
    pub fn with_day(mut self, weekday: Weekday, day: DaySchedule) -> Self {
        self.days.insert(weekday, day);
        self
    }

    /// Windows for a weekday, if it is a working day.
    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        self.days.get(&weekday)
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_office_hours() {
        let schedule = WorkSchedule::office_hours();
        let monday = schedule.day(Weekday::Mon).unwrap();
        assert_eq!(monday.break_start(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(monday.break_end(), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert!(schedule.day(Weekday::Sat).is_none());
    }

    #[test]
    fn test_window_hours_out_of_range() {
        assert!(WorkWindow::hours(8, 25).is_none());
    }

    #[test]
    fn test_schedule_json() {
        let schedule = WorkSchedule::office_hours();
        let json = serde_json::to_string(&schedule).unwrap();
        let back: WorkSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
    }
}

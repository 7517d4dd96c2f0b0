//! Working-day calendar.
//!
//! # Responsibility
//! - Decide whether a single date is non-working (weekend or holiday).
//! - Count working days in an inclusive date range.
//!
//! # Invariants
//! - Ranges are inclusive on both ends; a reversed range counts zero days.
//! - Weekend handling is fixed (Saturday/Sunday); holidays are data.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

/// Calendar of non-working days used for leave deduction.
#[derive(Debug, Clone, Default)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
}

impl WorkCalendar {
    /// Calendar with weekends only, no holidays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar with weekends plus a fixed holiday list.
    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Whether the date is a weekend day or a registered holiday.
    pub fn is_non_working(&self, date: NaiveDate) -> bool {
        Self::is_weekend(date) || self.is_holiday(date)
    }

    /// Counts working days in the inclusive range `[start, end]`.
    ///
    /// Returns 0 when `end < start`.
    pub fn working_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 0;
        }
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| !self.is_non_working(*date))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::WorkCalendar;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn friday_to_monday_counts_two_working_days() {
        let calendar = WorkCalendar::new();
        // 2024-06-07 is a Friday, 2024-06-10 the following Monday.
        assert_eq!(calendar.working_days(date(2024, 6, 7), date(2024, 6, 10)), 2);
    }

    #[test]
    fn holiday_inside_range_is_excluded() {
        let calendar = WorkCalendar::with_holidays([date(2024, 6, 6)]);
        // Mon 2024-06-03 .. Fri 2024-06-07 with Thursday as holiday.
        assert_eq!(calendar.working_days(date(2024, 6, 3), date(2024, 6, 7)), 4);
    }

    #[test]
    fn reversed_range_counts_zero() {
        let calendar = WorkCalendar::new();
        assert_eq!(calendar.working_days(date(2024, 6, 10), date(2024, 6, 7)), 0);
    }

    #[test]
    fn weekend_and_holiday_are_non_working() {
        let calendar = WorkCalendar::with_holidays([date(2024, 5, 6)]);
        assert!(calendar.is_non_working(date(2024, 6, 8))); // Saturday
        assert!(calendar.is_non_working(date(2024, 5, 6))); // holiday (Monday)
        assert!(!calendar.is_non_working(date(2024, 6, 10)));
    }

    #[test]
    fn single_day_range_counts_itself_when_working() {
        let calendar = WorkCalendar::new();
        assert_eq!(calendar.working_days(date(2024, 6, 10), date(2024, 6, 10)), 1);
        assert_eq!(calendar.working_days(date(2024, 6, 9), date(2024, 6, 9)), 0);
    }
}

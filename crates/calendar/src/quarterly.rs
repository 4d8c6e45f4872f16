//! Quarterly second-Friday rebalance schedule.

use capra_primitives::Date;
use capra_traits::{RebalanceSchedule, ScheduleError};
use chrono::{Datelike, Duration, Weekday};
use polars::prelude::*;

/// A named, single-date calendar exception.
///
/// When a computed reference date matches `observed`, the date is shifted by
/// `shift_days`. Exchanges publish these shifts ad hoc (a reference date
/// falling into a holiday week), so the schedule carries them as data rather
/// than as conditionals in the date rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateShift {
    /// The computed date this shift applies to.
    pub observed: Date,
    /// Signed number of days to move the date.
    pub shift_days: i64,
    /// Human-readable reason for the shift.
    pub label: String,
}

impl DateShift {
    /// Create a new shift rule.
    #[must_use]
    pub fn new(observed: Date, shift_days: i64, label: impl Into<String>) -> Self {
        Self { observed, shift_days, label: label.into() }
    }

    /// The 2021 Christmas-week shift: 2021-12-24 moves forward to the next
    /// Monday, 2021-12-27.
    #[must_use]
    pub fn christmas_week_2021() -> Self {
        Self::new(
            Date::from_ymd_opt(2021, 12, 24).unwrap_or_default(),
            3,
            "Christmas week 2021",
        )
    }

    /// Apply this shift to a computed date, if it matches.
    #[must_use]
    pub fn apply(&self, date: Date) -> Date {
        if date == self.observed { date + Duration::days(self.shift_days) } else { date }
    }
}

/// The second Friday counting backward from the end of a month.
#[must_use]
pub fn second_friday_from_month_end(year: i32, month: u32) -> Option<Date> {
    let first_of_next = if month == 12 {
        Date::from_ymd_opt(year + 1, 1, 1)?
    } else {
        Date::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_of_next.pred_opt()?;

    let mut fridays = 0;
    loop {
        if day.weekday() == Weekday::Fri {
            fridays += 1;
            if fridays == 2 {
                return Some(day);
            }
        }
        day = day.pred_opt()?;
    }
}

/// Rebalance schedule taking the second Friday from month end of each
/// configured month, with manual holiday shifts.
///
/// A pure function of the year/month range; the record table is ignored.
#[derive(Debug, Clone)]
pub struct SecondFridaySchedule {
    months: Vec<u32>,
    start_year: i32,
    end_year: i32,
    shifts: Vec<DateShift>,
}

impl SecondFridaySchedule {
    /// Create a schedule over the given months and inclusive year range.
    ///
    /// The default shift set contains [`DateShift::christmas_week_2021`].
    #[must_use]
    pub fn new(months: Vec<u32>, start_year: i32, end_year: i32) -> Self {
        Self { months, start_year, end_year, shifts: vec![DateShift::christmas_week_2021()] }
    }

    /// Create a quarterly March/June/September/December schedule.
    #[must_use]
    pub fn quarterly(start_year: i32, end_year: i32) -> Self {
        Self::new(vec![3, 6, 9, 12], start_year, end_year)
    }

    /// Replace the shift rules.
    #[must_use]
    pub fn with_shifts(mut self, shifts: Vec<DateShift>) -> Self {
        self.shifts = shifts;
        self
    }

    fn validate(&self) -> Result<(), ScheduleError> {
        if let Some(month) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ScheduleError::InvalidMonth(*month));
        }
        if self.start_year > self.end_year {
            return Err(ScheduleError::EmptyYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        Ok(())
    }
}

impl RebalanceSchedule for SecondFridaySchedule {
    fn reference_dates(&self, _records: &DataFrame) -> Result<Vec<Date>, ScheduleError> {
        self.validate()?;

        let mut dates = Vec::new();
        for year in self.start_year..=self.end_year {
            for &month in &self.months {
                let Some(mut date) = second_friday_from_month_end(year, month) else {
                    continue;
                };
                for shift in &self.shifts {
                    date = shift.apply(date);
                }
                dates.push(date);
            }
        }

        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(2012, 9, d(2012, 9, 21))]
    #[case(2021, 12, d(2021, 12, 24))]
    #[case(2023, 6, d(2023, 6, 23))]
    #[case(2024, 2, d(2024, 2, 16))]
    fn second_friday_cases(#[case] year: i32, #[case] month: u32, #[case] expected: Date) {
        assert_eq!(second_friday_from_month_end(year, month), Some(expected));
    }

    #[test]
    fn christmas_2021_is_shifted_to_monday() {
        let schedule = SecondFridaySchedule::quarterly(2021, 2021);
        let dates = schedule.reference_dates(&DataFrame::empty()).unwrap();

        assert_eq!(dates, vec![d(2021, 3, 19), d(2021, 6, 18), d(2021, 9, 17), d(2021, 12, 27)]);
    }

    #[test]
    fn shift_rules_are_overridable() {
        let schedule = SecondFridaySchedule::quarterly(2021, 2021).with_shifts(Vec::new());
        let dates = schedule.reference_dates(&DataFrame::empty()).unwrap();

        assert_eq!(dates.last(), Some(&d(2021, 12, 24)));
    }

    #[test]
    fn dates_are_ascending_across_years() {
        let schedule = SecondFridaySchedule::quarterly(2019, 2020);
        let dates = schedule.reference_dates(&DataFrame::empty()).unwrap();

        assert_eq!(dates.len(), 8);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn invalid_month_is_rejected() {
        let schedule = SecondFridaySchedule::new(vec![3, 13], 2020, 2021);
        let err = schedule.reference_dates(&DataFrame::empty()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidMonth(13)));
    }

    #[test]
    fn empty_year_range_is_rejected() {
        let schedule = SecondFridaySchedule::quarterly(2022, 2020);
        let err = schedule.reference_dates(&DataFrame::empty()).unwrap_err();
        assert!(matches!(err, ScheduleError::EmptyYearRange { start: 2022, end: 2020 }));
    }
}

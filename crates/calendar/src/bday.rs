//! Business-day helpers.

use capra_primitives::Date;
use chrono::{Datelike, Weekday};

/// Whether a date falls on a weekday.
#[must_use]
pub fn is_business_day(date: Date) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first weekday strictly after `date`.
#[must_use]
pub fn next_business_day(date: Date) -> Date {
    let mut next = date.succ_opt().unwrap_or(date);
    while !is_business_day(next) {
        next = next.succ_opt().unwrap_or(next);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_is_not_a_business_day() {
        // 2021-12-25 is a Saturday.
        assert!(!is_business_day(Date::from_ymd_opt(2021, 12, 25).unwrap()));
        assert!(is_business_day(Date::from_ymd_opt(2021, 12, 24).unwrap()));
    }

    #[test]
    fn next_business_day_skips_weekend() {
        // Friday -> Monday.
        let friday = Date::from_ymd_opt(2021, 12, 24).unwrap();
        assert_eq!(next_business_day(friday), Date::from_ymd_opt(2021, 12, 27).unwrap());
    }

    #[test]
    fn next_business_day_midweek() {
        let tuesday = Date::from_ymd_opt(2022, 3, 1).unwrap();
        assert_eq!(next_business_day(tuesday), Date::from_ymd_opt(2022, 3, 2).unwrap());
    }
}

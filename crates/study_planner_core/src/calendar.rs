//! crates/study_planner_core/src/calendar.rs
//!
//! A lazy sequence of study days derived from a start date and weekly availability.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{DayOfWeek, StudyDays};
use crate::error::{PlannerError, PlannerResult};

/// Weekly availability anchored at a start date.
///
/// The calendar holds no state beyond its inputs: every call to [`days`](Self::days)
/// starts over from `start_date` and yields the same sequence.
#[derive(Debug, Clone)]
pub struct AvailabilityCalendar {
    start_date: NaiveDate,
    // Indexed by days from Monday; zero means the weekday is not studied.
    hours: [Decimal; 7],
}

impl AvailabilityCalendar {
    /// Fails when no weekday has hours > 0, since such a calendar never yields a day.
    pub fn new(start_date: NaiveDate, study_days: &StudyDays) -> PlannerResult<Self> {
        let mut hours = [Decimal::ZERO; 7];
        let mut any = false;
        for (day, available) in study_days.active_days() {
            hours[day.number_from_monday() as usize] = available;
            any = true;
        }
        if !any {
            return Err(PlannerError::Validation(
                "At least one study day with hours greater than zero is required".to_string(),
            ));
        }
        Ok(Self { start_date, hours })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn hours_on(&self, date: NaiveDate) -> Decimal {
        self.hours[date.weekday().num_days_from_monday() as usize]
    }

    pub fn is_study_day(&self, day: DayOfWeek) -> bool {
        self.hours[day.number_from_monday() as usize] > Decimal::ZERO
    }

    /// Infinite iterator of `(date, hours_available)` for study days only.
    pub fn days(&self) -> StudyDayIter<'_> {
        StudyDayIter {
            calendar: self,
            next: Some(self.start_date),
        }
    }
}

pub struct StudyDayIter<'a> {
    calendar: &'a AvailabilityCalendar,
    next: Option<NaiveDate>,
}

impl Iterator for StudyDayIter<'_> {
    type Item = (NaiveDate, Decimal);

    fn next(&mut self) -> Option<Self::Item> {
        // At least one weekday has capacity, so this finds a day within seven steps
        // unless chrono runs out of representable dates.
        loop {
            let date = self.next?;
            self.next = date.succ_opt();
            let hours = self.calendar.hours_on(date);
            if hours > Decimal::ZERO {
                return Some((date, hours));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn yields_only_configured_weekdays() {
        let days = StudyDays::new()
            .with(DayOfWeek::Monday, Decimal::from(2))
            .with(DayOfWeek::Wednesday, Decimal::from(1));
        let calendar = AvailabilityCalendar::new(date(2024, 1, 1), &days).unwrap();

        let first: Vec<_> = calendar.days().take(4).collect();
        assert_eq!(
            first,
            vec![
                (date(2024, 1, 1), Decimal::from(2)),
                (date(2024, 1, 3), Decimal::from(1)),
                (date(2024, 1, 8), Decimal::from(2)),
                (date(2024, 1, 10), Decimal::from(1)),
            ]
        );
    }

    #[test]
    fn start_date_mid_week_skips_to_next_study_day() {
        let days = StudyDays::new().with(DayOfWeek::Monday, Decimal::from(3));
        // 2024-01-03 is a Wednesday.
        let calendar = AvailabilityCalendar::new(date(2024, 1, 3), &days).unwrap();
        assert_eq!(calendar.days().next(), Some((date(2024, 1, 8), Decimal::from(3))));
    }

    #[test]
    fn zero_hour_days_are_ignored() {
        let days = StudyDays::new()
            .with(DayOfWeek::Monday, Decimal::ZERO)
            .with(DayOfWeek::Tuesday, Decimal::from(1));
        let calendar = AvailabilityCalendar::new(date(2024, 1, 1), &days).unwrap();
        assert!(!calendar.is_study_day(DayOfWeek::Monday));
        assert_eq!(calendar.days().next(), Some((date(2024, 1, 2), Decimal::from(1))));
    }

    #[test]
    fn restarting_produces_the_same_sequence() {
        let days = StudyDays::new().with(DayOfWeek::Friday, Decimal::new(15, 1));
        let calendar = AvailabilityCalendar::new(date(2024, 2, 27), &days).unwrap();
        let a: Vec<_> = calendar.days().take(10).collect();
        let b: Vec<_> = calendar.days().take(10).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_or_all_zero_availability_is_rejected() {
        let empty = StudyDays::new();
        assert!(matches!(
            AvailabilityCalendar::new(date(2024, 1, 1), &empty),
            Err(PlannerError::Validation(_))
        ));

        let zeros = StudyDays::new().with(DayOfWeek::Sunday, Decimal::ZERO);
        assert!(matches!(
            AvailabilityCalendar::new(date(2024, 1, 1), &zeros),
            Err(PlannerError::Validation(_))
        ));
    }
}

//! crates/study_planner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of decimal places every hours value is normalized to.
pub const HOURS_SCALE: u32 = 2;

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an hours value to the single representation used across the crate.
pub fn normalize_hours(hours: Decimal) -> Decimal {
    hours.round_dp_with_strategy(HOURS_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("unknown difficulty level '{}'", other)),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level subject area such as "JavaScript".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technology {
    pub id: Uuid,
    pub name: String,
    /// Lower ranks are studied first.
    pub complexity_rank: i32,
}

/// A unit of study within a technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtopic {
    pub id: Uuid,
    pub technology_id: Uuid,
    pub name: String,
    pub hours_required: Decimal,
    pub difficulty_level: DifficultyLevel,
    pub order_index: i32,
}

/// A technology together with its subtopics, as served by the catalog endpoint.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub technology: Technology,
    pub subtopics: Vec<Subtopic>,
}

//=========================================================================================
// Weekly availability
//=========================================================================================

/// Day of week, numbered from Monday = 0 for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn number_from_monday(&self) -> i16 {
        Weekday::from(*self).num_days_from_monday() as i16
    }

    pub fn from_number_from_monday(n: i16) -> Option<Self> {
        usize::try_from(n).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayOfWeek::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown day of week '{}'", s))
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hours available per weekday. Days mapped to zero hours do not take part in scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyDays(BTreeMap<DayOfWeek, Decimal>);

impl StudyDays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, day: DayOfWeek, hours: Decimal) {
        self.0.insert(day, hours);
    }

    pub fn with(mut self, day: DayOfWeek, hours: Decimal) -> Self {
        self.set(day, hours);
        self
    }

    pub fn hours_for(&self, day: DayOfWeek) -> Option<Decimal> {
        self.0.get(&day).copied()
    }

    /// Entries with hours > 0, in weekday order.
    pub fn active_days(&self) -> impl Iterator<Item = (DayOfWeek, Decimal)> + '_ {
        self.0
            .iter()
            .filter(|(_, hours)| **hours > Decimal::ZERO)
            .map(|(day, hours)| (*day, *hours))
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, Decimal)> + '_ {
        self.0.iter().map(|(day, hours)| (*day, *hours))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn weekly_hours(&self) -> Decimal {
        self.active_days().map(|(_, hours)| hours).sum()
    }
}

impl FromIterator<(DayOfWeek, Decimal)> for StudyDays {
    fn from_iter<I: IntoIterator<Item = (DayOfWeek, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//=========================================================================================
// Study configurations and sessions
//=========================================================================================

/// A user's weekly availability and technology selection.
#[derive(Debug, Clone)]
pub struct StudyConfiguration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub study_days: StudyDays,
    /// Selected technologies in the order the user picked them.
    pub technology_ids: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated configuration that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewStudyConfiguration {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub study_days: StudyDays,
    pub technology_ids: Vec<Uuid>,
}

/// One scheduled fragment of a subtopic on a given day.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub id: Uuid,
    pub configuration_id: Uuid,
    pub user_id: Uuid,
    pub technology_id: Uuid,
    pub subtopic_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_hours: Decimal,
    pub sequence: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// A session produced by the materializer. The persistence layer stamps the
/// configuration and user ids when it writes the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudySession {
    pub technology_id: Uuid,
    pub subtopic_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_hours: Decimal,
    pub sequence: i32,
}

//=========================================================================================
// Quiz results
//=========================================================================================

#[derive(Debug, Clone)]
pub struct QuizResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtopic_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuizResult {
    pub user_id: Uuid,
    pub subtopic_id: Uuid,
    pub score: i32,
    pub max_score: i32,
}

//=========================================================================================
// Users and authentication
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_round_trips_through_storage_number() {
        for day in DayOfWeek::ALL {
            let n = day.number_from_monday();
            assert_eq!(DayOfWeek::from_number_from_monday(n), Some(day));
        }
        assert_eq!(DayOfWeek::from_number_from_monday(7), None);
        assert_eq!(DayOfWeek::from_number_from_monday(-1), None);
    }

    #[test]
    fn day_of_week_parses_case_insensitively() {
        assert_eq!("Monday".parse::<DayOfWeek>(), Ok(DayOfWeek::Monday));
        assert_eq!(" sunday ".parse::<DayOfWeek>(), Ok(DayOfWeek::Sunday));
        assert!("funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn study_days_skip_zero_hours() {
        let days = StudyDays::new()
            .with(DayOfWeek::Monday, Decimal::from(2))
            .with(DayOfWeek::Tuesday, Decimal::ZERO)
            .with(DayOfWeek::Friday, Decimal::new(15, 1));

        let active: Vec<_> = days.active_days().map(|(d, _)| d).collect();
        assert_eq!(active, vec![DayOfWeek::Monday, DayOfWeek::Friday]);
        assert_eq!(days.weekly_hours(), Decimal::new(35, 1));
    }

    #[test]
    fn hours_round_to_two_places() {
        assert_eq!(normalize_hours(Decimal::new(1255, 3)), Decimal::new(126, 2));
        assert_eq!(normalize_hours(Decimal::new(15, 1)), Decimal::new(150, 2));
    }

    #[test]
    fn round2_rounds_halves_away_from_zero() {
        assert_eq!(round2(Decimal::new(66665, 3)), Decimal::new(6667, 2));
        assert_eq!(round2(Decimal::new(-125, 3)), Decimal::new(-13, 2));
    }
}

//! crates/study_planner_core/src/progress.rs
//!
//! Aggregates session completion and quiz scores for a study plan.

use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{round2, QuizResult, StudySession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtopicProgress {
    pub subtopic_id: Uuid,
    pub technology_id: Uuid,
    pub scheduled_hours: Decimal,
    pub completed_hours: Decimal,
    pub sessions: usize,
    pub completed_sessions: usize,
    pub quiz_attempts: usize,
    pub average_quiz_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub configuration_id: Uuid,
    pub total_hours: Decimal,
    pub completed_hours: Decimal,
    pub remaining_hours: Decimal,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub completion_percentage: Decimal,
    /// In the order the subtopics first appear in the schedule.
    pub subtopics: Vec<SubtopicProgress>,
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2(part * Decimal::ONE_HUNDRED / whole)
}

/// Builds the progress summary for one configuration. Quiz results for subtopics
/// that are not part of the schedule are ignored.
pub fn summarize(
    configuration_id: Uuid,
    sessions: &[StudySession],
    quizzes: &[QuizResult],
) -> ProgressSummary {
    let mut ordered: Vec<&StudySession> = sessions.iter().collect();
    ordered.sort_by_key(|s| (s.scheduled_date, s.sequence));

    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut subtopics: Vec<SubtopicProgress> = Vec::new();
    for session in ordered {
        let slot = *index.entry(session.subtopic_id).or_insert_with(|| {
            subtopics.push(SubtopicProgress {
                subtopic_id: session.subtopic_id,
                technology_id: session.technology_id,
                scheduled_hours: Decimal::ZERO,
                completed_hours: Decimal::ZERO,
                sessions: 0,
                completed_sessions: 0,
                quiz_attempts: 0,
                average_quiz_percentage: None,
            });
            subtopics.len() - 1
        });
        let entry = &mut subtopics[slot];
        entry.scheduled_hours += session.scheduled_hours;
        entry.sessions += 1;
        if session.is_completed {
            entry.completed_hours += session.scheduled_hours;
            entry.completed_sessions += 1;
        }
    }

    let mut quiz_totals: HashMap<Uuid, (Decimal, usize)> = HashMap::new();
    for quiz in quizzes.iter().filter(|q| q.max_score > 0) {
        let pct = Decimal::from(quiz.score) * Decimal::ONE_HUNDRED / Decimal::from(quiz.max_score);
        let total = quiz_totals.entry(quiz.subtopic_id).or_default();
        total.0 += pct;
        total.1 += 1;
    }
    for entry in &mut subtopics {
        if let Some((sum, attempts)) = quiz_totals.get(&entry.subtopic_id) {
            entry.quiz_attempts = *attempts;
            entry.average_quiz_percentage =
                Some(round2(*sum / Decimal::from(*attempts as u64)));
        }
    }

    let total_hours: Decimal = subtopics.iter().map(|s| s.scheduled_hours).sum();
    let completed_hours: Decimal = subtopics.iter().map(|s| s.completed_hours).sum();

    ProgressSummary {
        configuration_id,
        total_hours,
        completed_hours,
        remaining_hours: total_hours - completed_hours,
        total_sessions: sessions.len(),
        completed_sessions: sessions.iter().filter(|s| s.is_completed).count(),
        completion_percentage: percentage(completed_hours, total_hours),
        subtopics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn session(subtopic_id: Uuid, day: u32, hours: i64, done: bool, sequence: i32) -> StudySession {
        StudySession {
            id: Uuid::new_v4(),
            configuration_id: Uuid::nil(),
            user_id: Uuid::nil(),
            technology_id: Uuid::nil(),
            subtopic_id,
            scheduled_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            scheduled_hours: Decimal::from(hours),
            sequence,
            is_completed: done,
            completed_at: done.then(Utc::now),
            notes: None,
        }
    }

    fn quiz(subtopic_id: Uuid, score: i32, max_score: i32) -> QuizResult {
        QuizResult {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            subtopic_id,
            score,
            max_score,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn totals_and_percentages() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let sessions = vec![
            session(a, 1, 2, true, 0),
            session(a, 3, 1, false, 1),
            session(b, 8, 1, true, 2),
        ];
        let quizzes = vec![quiz(a, 8, 10), quiz(a, 5, 10), quiz(Uuid::new_v4(), 1, 1)];

        let summary = summarize(Uuid::nil(), &sessions, &quizzes);

        assert_eq!(summary.total_hours, Decimal::from(4));
        assert_eq!(summary.completed_hours, Decimal::from(3));
        assert_eq!(summary.remaining_hours, Decimal::from(1));
        assert_eq!(summary.completed_sessions, 2);
        assert_eq!(summary.completion_percentage, Decimal::from(75));

        assert_eq!(summary.subtopics.len(), 2);
        assert_eq!(summary.subtopics[0].subtopic_id, a);
        assert_eq!(summary.subtopics[0].quiz_attempts, 2);
        assert_eq!(summary.subtopics[0].average_quiz_percentage, Some(Decimal::new(65, 0)));
        assert_eq!(summary.subtopics[1].average_quiz_percentage, None);
    }

    #[test]
    fn empty_schedule_reports_zero() {
        let summary = summarize(Uuid::nil(), &[], &[]);
        assert_eq!(summary.total_hours, Decimal::ZERO);
        assert_eq!(summary.completion_percentage, Decimal::ZERO);
        assert!(summary.subtopics.is_empty());
    }
}

//! services/api/src/web/rest.rs
//!
//! Contains the REST payload structs shared by the handlers and the master
//! definition for the OpenAPI specification.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use study_planner_core::{
    CatalogEntry, DayOfWeek, ProgressSummary, QuizResult, StudyConfiguration, StudyDays,
    StudySession, Subtopic, SubtopicProgress,
};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::auth::{AuthResponse, LoginRequest, SignupRequest};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::catalog::list_technologies_handler,
        crate::web::study_config::create_study_config_handler,
        crate::web::study_config::active_study_config_handler,
        crate::web::study_config::generate_schedule_handler,
        crate::web::study_config::list_config_sessions_handler,
        crate::web::study_config::reset_study_config_handler,
        crate::web::study_sessions::update_session_handler,
        crate::web::study_sessions::delete_session_handler,
        crate::web::progress::record_quiz_result_handler,
        crate::web::progress::progress_handler,
    ),
    components(
        schemas(
            SignupRequest, LoginRequest, AuthResponse, ErrorBody,
            TechnologyResponse, SubtopicResponse,
            CreateStudyConfigRequest, StudyConfigResponse, CreateStudyConfigResponse,
            StudySessionResponse, UpdateSessionRequest,
            QuizResultRequest, QuizResultResponse,
            ProgressResponse, SubtopicProgressResponse,
        )
    ),
    tags(
        (name = "auth", description = "Account signup, login and logout."),
        (name = "study planner", description = "Catalog, study configurations and generated study sessions."),
        (name = "progress", description = "Quiz results and progress reporting.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct SubtopicResponse {
    pub id: Uuid,
    pub name: String,
    pub hours_required: Decimal,
    /// One of `beginner`, `intermediate`, `advanced`.
    pub difficulty_level: String,
    pub order_index: i32,
}

impl From<Subtopic> for SubtopicResponse {
    fn from(s: Subtopic) -> Self {
        Self {
            id: s.id,
            name: s.name,
            hours_required: s.hours_required,
            difficulty_level: s.difficulty_level.to_string(),
            order_index: s.order_index,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TechnologyResponse {
    pub id: Uuid,
    pub name: String,
    pub complexity_rank: i32,
    pub subtopics: Vec<SubtopicResponse>,
}

impl From<CatalogEntry> for TechnologyResponse {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.technology.id,
            name: entry.technology.name,
            complexity_rank: entry.technology.complexity_rank,
            subtopics: entry.subtopics.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// Study configurations
//=========================================================================================

/// The payload for creating a study plan.
#[derive(Deserialize, ToSchema)]
pub struct CreateStudyConfigRequest {
    pub start_date: NaiveDate,
    /// Hours per weekday, keyed by lowercase day name (e.g. `{"monday": 2, "wednesday": 1.5}`).
    pub study_days: BTreeMap<String, Decimal>,
    /// Selected technologies, in order of preference.
    pub technology_ids: Vec<Uuid>,
}

/// Converts the JSON weekday map, rejecting unknown day names.
pub fn parse_study_days(raw: &BTreeMap<String, Decimal>) -> Result<StudyDays, ApiError> {
    raw.iter()
        .map(|(day, hours)| {
            day.parse::<DayOfWeek>()
                .map(|d| (d, *hours))
                .map_err(ApiError::BadRequest)
        })
        .collect()
}

#[derive(Serialize, ToSchema)]
pub struct StudyConfigResponse {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub study_days: BTreeMap<String, Decimal>,
    pub technology_ids: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<StudyConfiguration> for StudyConfigResponse {
    fn from(c: StudyConfiguration) -> Self {
        Self {
            id: c.id,
            start_date: c.start_date,
            study_days: c
                .study_days
                .iter()
                .map(|(day, hours)| (day.to_string(), hours))
                .collect(),
            technology_ids: c.technology_ids,
            is_active: c.is_active,
            created_at: c.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreateStudyConfigResponse {
    pub configuration: StudyConfigResponse,
    pub sessions: Vec<StudySessionResponse>,
}

//=========================================================================================
// Study sessions
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct StudySessionResponse {
    pub id: Uuid,
    pub configuration_id: Uuid,
    pub technology_id: Uuid,
    pub subtopic_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_hours: Decimal,
    pub sequence: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<StudySession> for StudySessionResponse {
    fn from(s: StudySession) -> Self {
        Self {
            id: s.id,
            configuration_id: s.configuration_id,
            technology_id: s.technology_id,
            subtopic_id: s.subtopic_id,
            scheduled_date: s.scheduled_date,
            scheduled_hours: s.scheduled_hours,
            sequence: s.sequence,
            is_completed: s.is_completed,
            completed_at: s.completed_at,
            notes: s.notes,
        }
    }
}

pub fn session_responses(sessions: Vec<StudySession>) -> Vec<StudySessionResponse> {
    sessions.into_iter().map(Into::into).collect()
}

/// Fields left out are not changed. An empty `notes` string clears the notes.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateSessionRequest {
    pub is_completed: Option<bool>,
    pub notes: Option<String>,
}

//=========================================================================================
// Quizzes and progress
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct QuizResultRequest {
    pub subtopic_id: Uuid,
    pub score: i32,
    pub max_score: i32,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResultResponse {
    pub id: Uuid,
    pub subtopic_id: Uuid,
    pub score: i32,
    pub max_score: i32,
    pub taken_at: DateTime<Utc>,
}

impl From<QuizResult> for QuizResultResponse {
    fn from(q: QuizResult) -> Self {
        Self {
            id: q.id,
            subtopic_id: q.subtopic_id,
            score: q.score,
            max_score: q.max_score,
            taken_at: q.taken_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SubtopicProgressResponse {
    pub subtopic_id: Uuid,
    pub technology_id: Uuid,
    pub scheduled_hours: Decimal,
    pub completed_hours: Decimal,
    pub sessions: usize,
    pub completed_sessions: usize,
    pub quiz_attempts: usize,
    pub average_quiz_percentage: Option<Decimal>,
}

impl From<SubtopicProgress> for SubtopicProgressResponse {
    fn from(p: SubtopicProgress) -> Self {
        Self {
            subtopic_id: p.subtopic_id,
            technology_id: p.technology_id,
            scheduled_hours: p.scheduled_hours,
            completed_hours: p.completed_hours,
            sessions: p.sessions,
            completed_sessions: p.completed_sessions,
            quiz_attempts: p.quiz_attempts,
            average_quiz_percentage: p.average_quiz_percentage,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub configuration_id: Uuid,
    pub total_hours: Decimal,
    pub completed_hours: Decimal,
    pub remaining_hours: Decimal,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub completion_percentage: Decimal,
    pub subtopics: Vec<SubtopicProgressResponse>,
}

impl From<ProgressSummary> for ProgressResponse {
    fn from(p: ProgressSummary) -> Self {
        Self {
            configuration_id: p.configuration_id,
            total_hours: p.total_hours,
            completed_hours: p.completed_hours,
            remaining_hours: p.remaining_hours,
            total_sessions: p.total_sessions,
            completed_sessions: p.completed_sessions,
            completion_percentage: p.completion_percentage,
            subtopics: p.subtopics.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_days_accept_day_names() {
        let mut raw = BTreeMap::new();
        raw.insert("Monday".to_string(), Decimal::from(2));
        raw.insert("wednesday".to_string(), Decimal::new(15, 1));

        let days = parse_study_days(&raw).unwrap();
        assert_eq!(days.hours_for(DayOfWeek::Monday), Some(Decimal::from(2)));
        assert_eq!(days.hours_for(DayOfWeek::Wednesday), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn unknown_day_is_a_bad_request() {
        let mut raw = BTreeMap::new();
        raw.insert("someday".to_string(), Decimal::ONE);
        assert!(matches!(parse_study_days(&raw), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn openapi_document_lists_study_routes() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/study-config/{id}/generate-schedule"));
        assert!(json.contains("/progress"));
    }
}

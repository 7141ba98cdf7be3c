//! crates/study_planner_core/src/planner.rs
//!
//! The application service behind the study-plan endpoints. It validates input,
//! runs resolver -> scheduler -> materializer and enforces that users only touch
//! their own configurations and sessions.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::AvailabilityCalendar;
use crate::domain::{
    normalize_hours, CatalogEntry, NewQuizResult, NewStudyConfiguration, QuizResult, StudyConfiguration,
    StudyDays, StudySession,
};
use crate::error::{PlannerError, PlannerResult};
use crate::materializer::SessionMaterializer;
use crate::ports::{DatabaseService, PortError};
use crate::progress::{summarize, ProgressSummary};
use crate::resolver::resolve_work_items;
use crate::scheduler::{Allocation, Scheduler};

/// Hours in a day; no study day may ask for more.
const MAX_DAILY_HOURS: i64 = 24;

/// A user's request for a new study plan.
#[derive(Debug, Clone)]
pub struct StudyConfigRequest {
    pub start_date: NaiveDate,
    pub study_days: StudyDays,
    pub technology_ids: Vec<Uuid>,
}

/// Partial update of a session. `None` leaves the field untouched; an empty
/// notes string clears the notes.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub is_completed: Option<bool>,
    pub notes: Option<String>,
}

pub struct StudyPlanner {
    db: Arc<dyn DatabaseService>,
    scheduler: Scheduler,
    materializer: SessionMaterializer,
}

impl StudyPlanner {
    pub fn new(db: Arc<dyn DatabaseService>, scheduler: Scheduler) -> Self {
        Self {
            materializer: SessionMaterializer::new(db.clone()),
            db,
            scheduler,
        }
    }

    //=====================================================================================
    // Catalog
    //=====================================================================================

    pub async fn catalog(&self) -> PlannerResult<Vec<CatalogEntry>> {
        let technologies = self.db.list_technologies().await?;
        let ids: Vec<Uuid> = technologies.iter().map(|t| t.id).collect();
        let subtopics = self.db.list_subtopics_for_technologies(&ids).await?;

        Ok(technologies
            .into_iter()
            .map(|technology| {
                let mut own: Vec<_> = subtopics
                    .iter()
                    .filter(|s| s.technology_id == technology.id)
                    .cloned()
                    .collect();
                own.sort_by_key(|s| s.order_index);
                CatalogEntry {
                    technology,
                    subtopics: own,
                }
            })
            .collect())
    }

    //=====================================================================================
    // Configurations and schedule generation
    //=====================================================================================

    /// Validates the request, builds its schedule and stores both as the user's
    /// active plan, replacing any previous one.
    pub async fn create_configuration(
        &self,
        user_id: Uuid,
        request: StudyConfigRequest,
    ) -> PlannerResult<(StudyConfiguration, Vec<StudySession>)> {
        let request = validate_request(request)?;
        let allocations = self
            .plan(request.start_date, &request.study_days, &request.technology_ids)
            .await?;

        let config = NewStudyConfiguration {
            user_id,
            start_date: request.start_date,
            study_days: request.study_days,
            technology_ids: request.technology_ids,
        };
        self.materializer.activate(config, &allocations).await
    }

    /// Rebuilds the schedule of an active configuration, discarding its current sessions.
    pub async fn generate_schedule(
        &self,
        user_id: Uuid,
        configuration_id: Uuid,
    ) -> PlannerResult<Vec<StudySession>> {
        let config = self.owned_configuration(user_id, configuration_id).await?;
        if !config.is_active {
            return Err(PlannerError::Validation(format!(
                "Configuration {} is not active",
                configuration_id
            )));
        }
        let allocations = self
            .plan(config.start_date, &config.study_days, &config.technology_ids)
            .await?;
        self.materializer.replace(config.id, &allocations).await
    }

    pub async fn active_configuration(&self, user_id: Uuid) -> PlannerResult<StudyConfiguration> {
        self.db
            .get_active_configuration(user_id)
            .await?
            .ok_or_else(|| {
                PortError::NotFound(format!("No active study configuration for user {}", user_id))
                    .into()
            })
    }

    /// Deactivates the user's plan and deletes its sessions.
    pub async fn reset(&self, user_id: Uuid) -> PlannerResult<u64> {
        let config = self.active_configuration(user_id).await?;
        let removed = self.db.deactivate_configuration(config.id).await?;
        info!(%user_id, configuration_id = %config.id, removed, "study plan reset");
        Ok(removed)
    }

    async fn plan(
        &self,
        start_date: NaiveDate,
        study_days: &StudyDays,
        technology_ids: &[Uuid],
    ) -> PlannerResult<Vec<Allocation>> {
        let calendar = AvailabilityCalendar::new(start_date, study_days)?;
        let technologies = self.db.list_technologies().await?;
        let subtopics = self.db.list_subtopics_for_technologies(technology_ids).await?;

        let items = resolve_work_items(technology_ids, &technologies, &subtopics)?;
        if items.is_empty() {
            return Err(PlannerError::Validation(
                "The selected technologies have no subtopics to schedule".to_string(),
            ));
        }

        let allocations = self.scheduler.schedule(&calendar, &items)?;
        info!(
            work_items = items.len(),
            sessions = allocations.len(),
            last_day = ?allocations.last().map(|a| a.date),
            "schedule computed"
        );
        Ok(allocations)
    }

    async fn owned_configuration(
        &self,
        user_id: Uuid,
        configuration_id: Uuid,
    ) -> PlannerResult<StudyConfiguration> {
        let config = self.db.get_configuration(configuration_id).await?;
        if config.user_id != user_id {
            warn!(%user_id, %configuration_id, "configuration requested by another user");
            return Err(PortError::NotFound(format!(
                "Study configuration {} not found",
                configuration_id
            ))
            .into());
        }
        Ok(config)
    }

    //=====================================================================================
    // Sessions
    //=====================================================================================

    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        configuration_id: Uuid,
    ) -> PlannerResult<Vec<StudySession>> {
        let config = self.owned_configuration(user_id, configuration_id).await?;
        Ok(self.db.list_sessions(config.id).await?)
    }

    pub async fn update_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        update: SessionUpdate,
    ) -> PlannerResult<StudySession> {
        let mut session = self.owned_session(user_id, session_id).await?;

        if let Some(done) = update.is_completed {
            if done != session.is_completed {
                let completed_at = done.then(Utc::now);
                session = self.db.set_session_completed(session_id, completed_at).await?;
            }
        }
        if let Some(notes) = update.notes {
            let notes = Some(notes.trim().to_string()).filter(|n| !n.is_empty());
            session = self.db.update_session_notes(session_id, notes).await?;
        }
        Ok(session)
    }

    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> PlannerResult<()> {
        let session = self.owned_session(user_id, session_id).await?;
        self.db.delete_session(session.id).await?;
        Ok(())
    }

    async fn owned_session(&self, user_id: Uuid, session_id: Uuid) -> PlannerResult<StudySession> {
        let session = self.db.get_session(session_id).await?;
        if session.user_id != user_id {
            warn!(%user_id, %session_id, "study session requested by another user");
            return Err(
                PortError::NotFound(format!("Study session {} not found", session_id)).into(),
            );
        }
        Ok(session)
    }

    //=====================================================================================
    // Quizzes and progress
    //=====================================================================================

    pub async fn record_quiz_result(
        &self,
        user_id: Uuid,
        subtopic_id: Uuid,
        score: i32,
        max_score: i32,
    ) -> PlannerResult<QuizResult> {
        if max_score <= 0 {
            return Err(PlannerError::Validation(
                "max_score must be greater than zero".to_string(),
            ));
        }
        if score < 0 || score > max_score {
            return Err(PlannerError::Validation(format!(
                "score must be between 0 and {}",
                max_score
            )));
        }
        let subtopic = self.db.get_subtopic(subtopic_id).await?;
        Ok(self
            .db
            .save_quiz_result(NewQuizResult {
                user_id,
                subtopic_id: subtopic.id,
                score,
                max_score,
            })
            .await?)
    }

    pub async fn progress(&self, user_id: Uuid) -> PlannerResult<ProgressSummary> {
        let config = self.active_configuration(user_id).await?;
        let sessions = self.db.list_sessions(config.id).await?;
        let quizzes = self.db.list_quiz_results(user_id).await?;
        Ok(summarize(config.id, &sessions, &quizzes))
    }
}

/// Checks the request and normalizes every hours value.
fn validate_request(request: StudyConfigRequest) -> PlannerResult<StudyConfigRequest> {
    if request.technology_ids.is_empty() {
        return Err(PlannerError::Validation(
            "Select at least one technology".to_string(),
        ));
    }

    let max = Decimal::from(MAX_DAILY_HOURS);
    let mut study_days = StudyDays::new();
    for (day, hours) in request.study_days.iter() {
        let hours = normalize_hours(hours);
        if hours < Decimal::ZERO || hours > max {
            return Err(PlannerError::Validation(format!(
                "Hours for {} must be between 0 and {}",
                day, MAX_DAILY_HOURS
            )));
        }
        study_days.set(day, hours);
    }
    if study_days.active_days().next().is_none() {
        return Err(PlannerError::Validation(
            "At least one study day with hours greater than zero is required".to_string(),
        ));
    }

    Ok(StudyConfigRequest {
        start_date: request.start_date,
        study_days,
        technology_ids: request.technology_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayOfWeek;

    fn request(study_days: StudyDays) -> StudyConfigRequest {
        StudyConfigRequest {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            study_days,
            technology_ids: vec![Uuid::new_v4()],
        }
    }

    #[test]
    fn validation_normalizes_hours() {
        let days = StudyDays::new().with(DayOfWeek::Monday, Decimal::new(1505, 3));
        let validated = validate_request(request(days)).unwrap();
        assert_eq!(
            validated.study_days.hours_for(DayOfWeek::Monday),
            Some(Decimal::new(151, 2))
        );
    }

    #[test]
    fn validation_rejects_out_of_range_hours() {
        let negative = StudyDays::new().with(DayOfWeek::Monday, Decimal::from(-1));
        assert!(matches!(
            validate_request(request(negative)),
            Err(PlannerError::Validation(_))
        ));

        let too_many = StudyDays::new().with(DayOfWeek::Monday, Decimal::from(25));
        assert!(matches!(
            validate_request(request(too_many)),
            Err(PlannerError::Validation(_))
        ));
    }

    #[test]
    fn validation_requires_a_technology() {
        let mut req = request(StudyDays::new().with(DayOfWeek::Monday, Decimal::ONE));
        req.technology_ids.clear();
        assert!(matches!(validate_request(req), Err(PlannerError::Validation(_))));
    }
}

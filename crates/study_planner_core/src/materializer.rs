//! crates/study_planner_core/src/materializer.rs
//!
//! Turns scheduler allocations into session records and writes them through the
//! persistence port as a single batch.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{NewStudyConfiguration, NewStudySession, StudyConfiguration, StudySession};
use crate::error::{PlannerError, PlannerResult};
use crate::ports::DatabaseService;
use crate::scheduler::Allocation;

/// Maps allocations one-to-one onto unsaved sessions.
pub fn to_new_sessions(allocations: &[Allocation]) -> PlannerResult<Vec<NewStudySession>> {
    allocations
        .iter()
        .map(|a| {
            let sequence = i32::try_from(a.sequence).map_err(|_| {
                PlannerError::Allocation(format!("Too many sessions ({})", allocations.len()))
            })?;
            Ok(NewStudySession {
                technology_id: a.technology_id,
                subtopic_id: a.subtopic_id,
                scheduled_date: a.date,
                scheduled_hours: a.hours,
                sequence,
            })
        })
        .collect()
}

/// Persists generated sessions. Every write is a single call into the port, which
/// either stores the whole batch or nothing.
pub struct SessionMaterializer {
    db: Arc<dyn DatabaseService>,
}

impl SessionMaterializer {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Stores `config` as the user's only active configuration together with its sessions.
    pub async fn activate(
        &self,
        config: NewStudyConfiguration,
        allocations: &[Allocation],
    ) -> PlannerResult<(StudyConfiguration, Vec<StudySession>)> {
        let sessions = to_new_sessions(allocations)?;
        let user_id = config.user_id;
        let (config, sessions) = self
            .db
            .activate_configuration_with_sessions(config, sessions)
            .await?;
        info!(
            %user_id,
            configuration_id = %config.id,
            sessions = sessions.len(),
            "activated study configuration"
        );
        Ok((config, sessions))
    }

    /// Swaps the sessions of an existing configuration for a freshly generated set.
    pub async fn replace(
        &self,
        configuration_id: Uuid,
        allocations: &[Allocation],
    ) -> PlannerResult<Vec<StudySession>> {
        let sessions = to_new_sessions(allocations)?;
        let sessions = self.db.replace_sessions(configuration_id, sessions).await?;
        info!(
            %configuration_id,
            sessions = sessions.len(),
            "regenerated study sessions"
        );
        Ok(sessions)
    }
}

//! crates/study_planner_core/src/memory.rs
//!
//! An in-process implementation of `DatabaseService`, used by the test suites and
//! for running the API without Postgres. Every compound write happens under one
//! lock, so it is as atomic as the SQL transactions in the Postgres adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    AuthSession, NewQuizResult, NewStudyConfiguration, NewStudySession, QuizResult,
    StudyConfiguration, StudySession, Subtopic, Technology, User, UserCredentials,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    auth_sessions: HashMap<String, AuthSession>,
    technologies: Vec<Technology>,
    subtopics: Vec<Subtopic>,
    configurations: Vec<StudyConfiguration>,
    sessions: Vec<StudySession>,
    quiz_results: Vec<QuizResult>,
    // Number of upcoming session batch writes that should fail, for rollback tests.
    failing_session_writes: usize,
}

#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with a catalog.
    pub fn with_catalog(technologies: Vec<Technology>, subtopics: Vec<Subtopic>) -> Self {
        let db = Self::default();
        if let Ok(mut tables) = db.tables.lock() {
            tables.technologies = technologies;
            tables.subtopics = subtopics;
        }
        db
    }

    /// Makes the next `count` session batch writes fail before touching any data.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_next_session_writes(&self, count: usize) -> PortResult<()> {
        self.lock()?.failing_session_writes = count;
        Ok(())
    }

    /// Number of sessions stored across every configuration.
    pub fn session_count(&self) -> PortResult<usize> {
        Ok(self.lock()?.sessions.len())
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

impl Tables {
    fn take_write_failure(&mut self) -> PortResult<()> {
        if self.failing_session_writes > 0 {
            self.failing_session_writes -= 1;
            return Err(PortError::Unexpected(
                "simulated session write failure".to_string(),
            ));
        }
        Ok(())
    }

    fn insert_sessions(
        &mut self,
        configuration_id: Uuid,
        user_id: Uuid,
        sessions: Vec<NewStudySession>,
    ) -> Vec<StudySession> {
        let stored: Vec<StudySession> = sessions
            .into_iter()
            .map(|s| StudySession {
                id: Uuid::new_v4(),
                configuration_id,
                user_id,
                technology_id: s.technology_id,
                subtopic_id: s.subtopic_id,
                scheduled_date: s.scheduled_date,
                scheduled_hours: s.scheduled_hours,
                sequence: s.sequence,
                is_completed: false,
                completed_at: None,
                notes: None,
            })
            .collect();
        self.sessions.extend(stored.iter().cloned());
        stored
    }

    fn session_mut(&mut self, session_id: Uuid) -> PortResult<&mut StudySession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Study session {} not found", session_id)))
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let user_id = Uuid::new_v4();
        tables.users.push(UserCredentials {
            user_id,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.lock()?
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.lock()?.auth_sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.lock()?;
        match tables.auth_sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.lock()?.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn list_technologies(&self) -> PortResult<Vec<Technology>> {
        let mut technologies = self.lock()?.technologies.clone();
        technologies.sort_by(|a, b| {
            a.complexity_rank
                .cmp(&b.complexity_rank)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(technologies)
    }

    async fn list_subtopics_for_technologies(
        &self,
        technology_ids: &[Uuid],
    ) -> PortResult<Vec<Subtopic>> {
        let mut subtopics: Vec<Subtopic> = self
            .lock()?
            .subtopics
            .iter()
            .filter(|s| technology_ids.contains(&s.technology_id))
            .cloned()
            .collect();
        subtopics.sort_by_key(|s| s.order_index);
        Ok(subtopics)
    }

    async fn get_subtopic(&self, subtopic_id: Uuid) -> PortResult<Subtopic> {
        self.lock()?
            .subtopics
            .iter()
            .find(|s| s.id == subtopic_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Subtopic {} not found", subtopic_id)))
    }

    async fn activate_configuration_with_sessions(
        &self,
        config: NewStudyConfiguration,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<(StudyConfiguration, Vec<StudySession>)> {
        let mut tables = self.lock()?;
        tables.take_write_failure()?;

        for existing in tables
            .configurations
            .iter_mut()
            .filter(|c| c.user_id == config.user_id && c.is_active)
        {
            existing.is_active = false;
        }

        let stored = StudyConfiguration {
            id: Uuid::new_v4(),
            user_id: config.user_id,
            start_date: config.start_date,
            study_days: config.study_days,
            technology_ids: config.technology_ids,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.configurations.push(stored.clone());
        let sessions = tables.insert_sessions(stored.id, stored.user_id, sessions);
        Ok((stored, sessions))
    }

    async fn get_configuration(&self, configuration_id: Uuid) -> PortResult<StudyConfiguration> {
        self.lock()?
            .configurations
            .iter()
            .find(|c| c.id == configuration_id)
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("Study configuration {} not found", configuration_id))
            })
    }

    async fn get_active_configuration(
        &self,
        user_id: Uuid,
    ) -> PortResult<Option<StudyConfiguration>> {
        Ok(self
            .lock()?
            .configurations
            .iter()
            .find(|c| c.user_id == user_id && c.is_active)
            .cloned())
    }

    async fn replace_sessions(
        &self,
        configuration_id: Uuid,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<Vec<StudySession>> {
        let mut tables = self.lock()?;
        tables.take_write_failure()?;

        let (user_id, is_active) = tables
            .configurations
            .iter()
            .find(|c| c.id == configuration_id)
            .map(|c| (c.user_id, c.is_active))
            .ok_or_else(|| {
                PortError::NotFound(format!("Study configuration {} not found", configuration_id))
            })?;
        if !is_active {
            return Err(PortError::Conflict(format!(
                "Study configuration {} is no longer active",
                configuration_id
            )));
        }
        tables.sessions.retain(|s| s.configuration_id != configuration_id);
        Ok(tables.insert_sessions(configuration_id, user_id, sessions))
    }

    async fn deactivate_configuration(&self, configuration_id: Uuid) -> PortResult<u64> {
        let mut tables = self.lock()?;
        let config = tables
            .configurations
            .iter_mut()
            .find(|c| c.id == configuration_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Study configuration {} not found", configuration_id))
            })?;
        config.is_active = false;

        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.configuration_id != configuration_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn list_sessions(&self, configuration_id: Uuid) -> PortResult<Vec<StudySession>> {
        let mut sessions: Vec<StudySession> = self
            .lock()?
            .sessions
            .iter()
            .filter(|s| s.configuration_id == configuration_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.scheduled_date, s.sequence));
        Ok(sessions)
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        Ok(self.lock()?.session_mut(session_id)?.clone())
    }

    async fn set_session_completed(
        &self,
        session_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<StudySession> {
        let mut tables = self.lock()?;
        let session = tables.session_mut(session_id)?;
        session.is_completed = completed_at.is_some();
        session.completed_at = completed_at;
        Ok(session.clone())
    }

    async fn update_session_notes(
        &self,
        session_id: Uuid,
        notes: Option<String>,
    ) -> PortResult<StudySession> {
        let mut tables = self.lock()?;
        let session = tables.session_mut(session_id)?;
        session.notes = notes;
        Ok(session.clone())
    }

    async fn delete_session(&self, session_id: Uuid) -> PortResult<()> {
        let mut tables = self.lock()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.id != session_id);
        if tables.sessions.len() == before {
            return Err(PortError::NotFound(format!(
                "Study session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn save_quiz_result(&self, result: NewQuizResult) -> PortResult<QuizResult> {
        let stored = QuizResult {
            id: Uuid::new_v4(),
            user_id: result.user_id,
            subtopic_id: result.subtopic_id,
            score: result.score,
            max_score: result.max_score,
            taken_at: Utc::now(),
        };
        self.lock()?.quiz_results.push(stored.clone());
        Ok(stored)
    }

    async fn list_quiz_results(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>> {
        Ok(self
            .lock()?
            .quiz_results
            .iter()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect())
    }
}

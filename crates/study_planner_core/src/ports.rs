//! crates/study_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    NewQuizResult, NewStudyConfiguration, NewStudySession, QuizResult, StudyConfiguration,
    StudySession, Subtopic, Technology, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user of an unexpired auth session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Catalog ---
    /// All technologies, ordered by complexity rank then name.
    async fn list_technologies(&self) -> PortResult<Vec<Technology>>;

    /// Subtopics belonging to any of the given technologies, ordered by `order_index`.
    async fn list_subtopics_for_technologies(
        &self,
        technology_ids: &[Uuid],
    ) -> PortResult<Vec<Subtopic>>;

    async fn get_subtopic(&self, subtopic_id: Uuid) -> PortResult<Subtopic>;

    // --- Study Configurations ---
    /// Atomically deactivates the user's current configuration, stores `config`
    /// as the active one and writes `sessions` for it. Nothing is written on failure.
    async fn activate_configuration_with_sessions(
        &self,
        config: NewStudyConfiguration,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<(StudyConfiguration, Vec<StudySession>)>;

    async fn get_configuration(&self, configuration_id: Uuid) -> PortResult<StudyConfiguration>;

    async fn get_active_configuration(&self, user_id: Uuid)
        -> PortResult<Option<StudyConfiguration>>;

    /// Atomically swaps every session of a configuration for `sessions`.
    /// Fails with `Conflict`, writing nothing, if the configuration is no longer active.
    async fn replace_sessions(
        &self,
        configuration_id: Uuid,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<Vec<StudySession>>;

    /// Soft-deletes the configuration and hard-deletes its sessions in one transaction.
    /// Returns the number of sessions removed.
    async fn deactivate_configuration(&self, configuration_id: Uuid) -> PortResult<u64>;

    // --- Study Sessions ---
    /// Sessions for a configuration, ordered by date then sequence.
    async fn list_sessions(&self, configuration_id: Uuid) -> PortResult<Vec<StudySession>>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<StudySession>;

    async fn set_session_completed(
        &self,
        session_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<StudySession>;

    async fn update_session_notes(
        &self,
        session_id: Uuid,
        notes: Option<String>,
    ) -> PortResult<StudySession>;

    async fn delete_session(&self, session_id: Uuid) -> PortResult<()>;

    // --- Quiz Results ---
    async fn save_quiz_result(&self, result: NewQuizResult) -> PortResult<QuizResult>;

    async fn list_quiz_results(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>>;
}

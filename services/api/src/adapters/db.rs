//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use study_planner_core::domain::{
    DayOfWeek, NewQuizResult, NewStudyConfiguration, NewStudySession, QuizResult,
    StudyConfiguration, StudyDays, StudySession, Subtopic, Technology, User, UserCredentials,
};
use study_planner_core::ports::{DatabaseService, PortError, PortResult};
use tracing::{info, warn};
use uuid::Uuid;

// Postgres caps a statement at 65535 bind parameters; session rows bind 9 each.
const SESSION_INSERT_CHUNK: usize = 5_000;

const SESSION_COLUMNS: &str = "id, configuration_id, user_id, technology_id, subtopic_id, \
     scheduled_date, scheduled_hours, sequence, is_completed, completed_at, notes";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Loads the weekday hours and technology selection of a configuration row.
    async fn hydrate(
        conn: &mut PgConnection,
        record: ConfigurationRecord,
    ) -> PortResult<StudyConfiguration> {
        let days = sqlx::query_as::<_, DayRecord>(
            "SELECT day_of_week, hours FROM study_configuration_days WHERE configuration_id = $1",
        )
        .bind(record.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;

        let technology_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT technology_id FROM study_configuration_technologies \
             WHERE configuration_id = $1 ORDER BY position ASC",
        )
        .bind(record.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(unexpected)?;

        let mut study_days = StudyDays::new();
        for day in days {
            let weekday = DayOfWeek::from_number_from_monday(day.day_of_week).ok_or_else(|| {
                PortError::Unexpected(format!("Invalid day_of_week {}", day.day_of_week))
            })?;
            study_days.set(weekday, day.hours);
        }

        Ok(StudyConfiguration {
            id: record.id,
            user_id: record.user_id,
            start_date: record.start_date,
            study_days,
            technology_ids,
            is_active: record.is_active,
            created_at: record.created_at,
        })
    }

    async fn insert_sessions(
        conn: &mut PgConnection,
        configuration_id: Uuid,
        user_id: Uuid,
        sessions: &[NewStudySession],
    ) -> PortResult<Vec<StudySession>> {
        let mut stored = Vec::with_capacity(sessions.len());
        for chunk in sessions.chunks(SESSION_INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO study_sessions (id, configuration_id, user_id, technology_id, \
                 subtopic_id, scheduled_date, scheduled_hours, sequence, is_completed) ",
            );
            builder.push_values(chunk, |mut row, s| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(configuration_id)
                    .push_bind(user_id)
                    .push_bind(s.technology_id)
                    .push_bind(s.subtopic_id)
                    .push_bind(s.scheduled_date)
                    .push_bind(s.scheduled_hours)
                    .push_bind(s.sequence)
                    .push_bind(false);
            });
            builder.push(" RETURNING ");
            builder.push(SESSION_COLUMNS);

            let records = builder
                .build_query_as::<SessionRecord>()
                .fetch_all(&mut *conn)
                .await
                .map_err(unexpected)?;
            stored.extend(records.into_iter().map(SessionRecord::to_domain));
        }
        stored.sort_by_key(|s| (s.scheduled_date, s.sequence));
        Ok(stored)
    }
}

/// Maps any sqlx error that has no more specific meaning.
fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct TechnologyRecord {
    id: Uuid,
    name: String,
    complexity_rank: i32,
}
impl TechnologyRecord {
    fn to_domain(self) -> Technology {
        Technology {
            id: self.id,
            name: self.name,
            complexity_rank: self.complexity_rank,
        }
    }
}

#[derive(FromRow)]
struct SubtopicRecord {
    id: Uuid,
    technology_id: Uuid,
    name: String,
    hours_required: Decimal,
    difficulty_level: String,
    order_index: i32,
}
impl SubtopicRecord {
    fn to_domain(self) -> PortResult<Subtopic> {
        Ok(Subtopic {
            id: self.id,
            technology_id: self.technology_id,
            name: self.name,
            hours_required: self.hours_required,
            difficulty_level: self.difficulty_level.parse().map_err(PortError::Unexpected)?,
            order_index: self.order_index,
        })
    }
}

#[derive(FromRow)]
struct ConfigurationRecord {
    id: Uuid,
    user_id: Uuid,
    start_date: NaiveDate,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct DayRecord {
    day_of_week: i16,
    hours: Decimal,
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    configuration_id: Uuid,
    user_id: Uuid,
    technology_id: Uuid,
    subtopic_id: Uuid,
    scheduled_date: NaiveDate,
    scheduled_hours: Decimal,
    sequence: i32,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}
impl SessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            configuration_id: self.configuration_id,
            user_id: self.user_id,
            technology_id: self.technology_id,
            subtopic_id: self.subtopic_id,
            scheduled_date: self.scheduled_date,
            scheduled_hours: self.scheduled_hours,
            sequence: self.sequence,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            notes: self.notes,
        }
    }
}

#[derive(FromRow)]
struct QuizResultRecord {
    id: Uuid,
    user_id: Uuid,
    subtopic_id: Uuid,
    score: i32,
    max_score: i32,
    taken_at: DateTime<Utc>,
}
impl QuizResultRecord {
    fn to_domain(self) -> QuizResult {
        QuizResult {
            id: self.id,
            user_id: self.user_id,
            subtopic_id: self.subtopic_id,
            score: self.score,
            max_score: self.max_score,
            taken_at: self.taken_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let user_id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Email {} is already registered", email))
            } else {
                unexpected(e)
            }
        })?;

        Ok(User {
            user_id,
            email: email.to_string(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar("SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_technologies(&self) -> PortResult<Vec<Technology>> {
        let records = sqlx::query_as::<_, TechnologyRecord>(
            "SELECT id, name, complexity_rank FROM technologies ORDER BY complexity_rank ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_subtopics_for_technologies(
        &self,
        technology_ids: &[Uuid],
    ) -> PortResult<Vec<Subtopic>> {
        let records = sqlx::query_as::<_, SubtopicRecord>(
            "SELECT id, technology_id, name, hours_required, difficulty_level, order_index \
             FROM subtopics WHERE technology_id = ANY($1) ORDER BY order_index ASC, name ASC",
        )
        .bind(technology_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_subtopic(&self, subtopic_id: Uuid) -> PortResult<Subtopic> {
        sqlx::query_as::<_, SubtopicRecord>(
            "SELECT id, technology_id, name, hours_required, difficulty_level, order_index \
             FROM subtopics WHERE id = $1",
        )
        .bind(subtopic_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Subtopic {} not found", subtopic_id)))?
        .to_domain()
    }

    async fn activate_configuration_with_sessions(
        &self,
        config: NewStudyConfiguration,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<(StudyConfiguration, Vec<StudySession>)> {
        // Dropping the transaction without commit rolls everything back.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Serializes concurrent activations for the same user.
        sqlx::query("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE")
            .bind(config.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| not_found_or_unexpected(e, format!("User {} not found", config.user_id)))?;

        let deactivated = sqlx::query(
            "UPDATE study_configurations SET is_active = FALSE WHERE user_id = $1 AND is_active",
        )
        .bind(config.user_id)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?
        .rows_affected();

        let record = sqlx::query_as::<_, ConfigurationRecord>(
            "INSERT INTO study_configurations (id, user_id, start_date, is_active) \
             VALUES ($1, $2, $3, TRUE) RETURNING id, user_id, start_date, is_active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(config.user_id)
        .bind(config.start_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("Another study configuration was activated concurrently".to_string())
            } else {
                unexpected(e)
            }
        })?;

        for (day, hours) in config.study_days.iter() {
            sqlx::query(
                "INSERT INTO study_configuration_days (configuration_id, day_of_week, hours) \
                 VALUES ($1, $2, $3)",
            )
            .bind(record.id)
            .bind(day.number_from_monday())
            .bind(hours)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        for (position, technology_id) in config.technology_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO study_configuration_technologies (configuration_id, technology_id, position) \
                 VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            )
            .bind(record.id)
            .bind(technology_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        let configuration_id = record.id;
        let stored_sessions =
            Self::insert_sessions(&mut tx, configuration_id, config.user_id, &sessions).await?;
        let stored_config = Self::hydrate(&mut tx, record).await?;

        tx.commit().await.map_err(unexpected)?;
        info!(
            user_id = %config.user_id,
            %configuration_id,
            deactivated,
            "study configuration committed"
        );
        Ok((stored_config, stored_sessions))
    }

    async fn get_configuration(&self, configuration_id: Uuid) -> PortResult<StudyConfiguration> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, ConfigurationRecord>(
            "SELECT id, user_id, start_date, is_active, created_at FROM study_configurations WHERE id = $1",
        )
        .bind(configuration_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Study configuration {} not found", configuration_id))
        })?;
        Self::hydrate(&mut conn, record).await
    }

    async fn get_active_configuration(
        &self,
        user_id: Uuid,
    ) -> PortResult<Option<StudyConfiguration>> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, ConfigurationRecord>(
            "SELECT id, user_id, start_date, is_active, created_at FROM study_configurations \
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => Ok(Some(Self::hydrate(&mut conn, record).await?)),
            None => Ok(None),
        }
    }

    async fn replace_sessions(
        &self,
        configuration_id: Uuid,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<Vec<StudySession>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Holding the row lock means a concurrent reset either finished before this
        // read or waits until the new sessions are committed.
        let (user_id, is_active): (Uuid, bool) = sqlx::query_as(
            "SELECT user_id, is_active FROM study_configurations WHERE id = $1 FOR UPDATE",
        )
        .bind(configuration_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            not_found_or_unexpected(e, format!("Study configuration {} not found", configuration_id))
        })?;
        if !is_active {
            return Err(PortError::Conflict(format!(
                "Study configuration {} is no longer active",
                configuration_id
            )));
        }

        let removed = sqlx::query("DELETE FROM study_sessions WHERE configuration_id = $1")
            .bind(configuration_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?
            .rows_affected();

        let stored = Self::insert_sessions(&mut tx, configuration_id, user_id, &sessions).await?;
        tx.commit().await.map_err(unexpected)?;
        info!(%configuration_id, removed, inserted = stored.len(), "study sessions replaced");
        Ok(stored)
    }

    async fn deactivate_configuration(&self, configuration_id: Uuid) -> PortResult<u64> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let updated = sqlx::query("UPDATE study_configurations SET is_active = FALSE WHERE id = $1")
            .bind(configuration_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if updated == 0 {
            return Err(PortError::NotFound(format!(
                "Study configuration {} not found",
                configuration_id
            )));
        }

        let removed = sqlx::query("DELETE FROM study_sessions WHERE configuration_id = $1")
            .bind(configuration_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?
            .rows_affected();

        tx.commit().await.map_err(unexpected)?;
        Ok(removed)
    }

    async fn list_sessions(&self, configuration_id: Uuid) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE configuration_id = $1 \
             ORDER BY scheduled_date ASC, sequence ASC",
            SESSION_COLUMNS
        ))
        .bind(configuration_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Study session {} not found", session_id)))?;
        Ok(record.to_domain())
    }

    async fn set_session_completed(
        &self,
        session_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE study_sessions SET is_completed = $2, completed_at = $3 WHERE id = $1 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(completed_at.is_some())
        .bind(completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Study session {} not found", session_id)))?;
        Ok(record.to_domain())
    }

    async fn update_session_notes(
        &self,
        session_id: Uuid,
        notes: Option<String>,
    ) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE study_sessions SET notes = $2 WHERE id = $1 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Study session {} not found", session_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_session(&self, session_id: Uuid) -> PortResult<()> {
        let deleted = sqlx::query("DELETE FROM study_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if deleted == 0 {
            warn!(%session_id, "delete requested for missing study session");
            return Err(PortError::NotFound(format!(
                "Study session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn save_quiz_result(&self, result: NewQuizResult) -> PortResult<QuizResult> {
        let record = sqlx::query_as::<_, QuizResultRecord>(
            "INSERT INTO quiz_results (id, user_id, subtopic_id, score, max_score) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, subtopic_id, score, max_score, taken_at",
        )
        .bind(Uuid::new_v4())
        .bind(result.user_id)
        .bind(result.subtopic_id)
        .bind(result.score)
        .bind(result.max_score)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_quiz_results(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>> {
        let records = sqlx::query_as::<_, QuizResultRecord>(
            "SELECT id, user_id, subtopic_id, score, max_score, taken_at FROM quiz_results \
             WHERE user_id = $1 ORDER BY taken_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

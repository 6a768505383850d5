//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every query borrows a connection from the shared pool for its own duration, so
//! connections are returned on every exit path, including errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use health_assistant_core::domain::{Reminder, SymptomCheck, UploadSummary};
use health_assistant_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

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
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ReminderRecord {
    title: String,
    scheduled_time: DateTime<Utc>,
    description: String,
}
impl ReminderRecord {
    fn to_domain(self) -> Reminder {
        Reminder {
            title: self.title,
            scheduled_time: self.scheduled_time,
            description: self.description,
        }
    }
}

#[derive(FromRow)]
struct SymptomCheckRecord {
    user_id: Uuid,
    symptoms: String,
    result: String,
    checked_at: DateTime<Utc>,
}
impl SymptomCheckRecord {
    fn to_domain(self) -> SymptomCheck {
        SymptomCheck {
            user_id: self.user_id,
            symptoms: self.symptoms,
            result: self.result,
            checked_at: self.checked_at,
        }
    }
}

#[derive(FromRow)]
struct UploadRecord {
    user_id: Uuid,
    file_name: String,
    file_type: String,
    storage_key: String,
    summary: String,
    uploaded_at: DateTime<Utc>,
}
impl UploadRecord {
    fn to_domain(self) -> UploadSummary {
        UploadSummary {
            user_id: self.user_id,
            filename: self.file_name,
            content_type: self.file_type,
            storage_key: self.storage_key,
            summary: self.summary,
            uploaded_at: self.uploaded_at,
        }
    }
}

const UPLOAD_COLUMNS: &str = "user_id, file_name, file_type, storage_key, summary, uploaded_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn resolve_session(&self, session_token: &str) -> PortResult<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT s.user_id FROM auth_sessions s \
             JOIN users u ON u.user_id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > NOW()",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(user_id)
    }

    async fn next_upcoming_reminder(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Reminder>> {
        let record = sqlx::query_as::<_, ReminderRecord>(
            "SELECT title, scheduled_time, description FROM reminders \
             WHERE user_id = $1 AND scheduled_time >= $2 \
             ORDER BY scheduled_time ASC LIMIT 1",
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ReminderRecord::to_domain))
    }

    async fn upcoming_reminders(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> PortResult<Vec<Reminder>> {
        let records = sqlx::query_as::<_, ReminderRecord>(
            "SELECT title, scheduled_time, description FROM reminders \
             WHERE user_id = $1 AND scheduled_time >= $2 \
             ORDER BY scheduled_time ASC LIMIT $3",
        )
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_reminder(&self, user_id: Uuid, reminder: &Reminder) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO reminders (id, user_id, title, scheduled_time, description) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&reminder.title)
        .bind(reminder.scheduled_time)
        .bind(&reminder.description)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_symptom_check(&self, check: &SymptomCheck) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO symptom_checks (id, user_id, symptoms, result, checked_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(check.user_id)
        .bind(&check.symptoms)
        .bind(&check.result)
        .bind(check.checked_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_upload(&self, upload: &UploadSummary) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO uploads (id, user_id, file_name, file_type, storage_key, summary, uploaded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(upload.user_id)
        .bind(&upload.filename)
        .bind(&upload.content_type)
        .bind(&upload.storage_key)
        .bind(&upload.summary)
        .bind(upload.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn recent_symptom_checks(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> PortResult<Vec<SymptomCheck>> {
        let records = sqlx::query_as::<_, SymptomCheckRecord>(
            "SELECT user_id, symptoms, result, checked_at FROM symptom_checks \
             WHERE user_id = $1 ORDER BY checked_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn recent_uploads(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<UploadSummary>> {
        let query = format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE user_id = $1 ORDER BY uploaded_at DESC LIMIT $2"
        );
        let records = sqlx::query_as::<_, UploadRecord>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_upload(
        &self,
        user_id: Uuid,
        storage_key: &str,
    ) -> PortResult<Option<UploadSummary>> {
        let query = format!(
            "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE user_id = $1 AND storage_key = $2 \
             ORDER BY uploaded_at DESC LIMIT 1"
        );
        let record = sqlx::query_as::<_, UploadRecord>(&query)
            .bind(user_id)
            .bind(storage_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(UploadRecord::to_domain))
    }
}

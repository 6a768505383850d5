//! crates/health_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ImageAttachment, Reminder, SymptomCheck, UploadSummary};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Sessions ---
    /// Resolves an auth session token to its user, or `None` if the token is
    /// unknown or expired.
    async fn resolve_session(&self, session_token: &str) -> PortResult<Option<Uuid>>;

    // --- Reminders ---
    /// The single nearest reminder scheduled at or after `now`.
    async fn next_upcoming_reminder(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Reminder>>;

    async fn upcoming_reminders(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> PortResult<Vec<Reminder>>;

    async fn create_reminder(&self, user_id: Uuid, reminder: &Reminder) -> PortResult<()>;

    // --- Stored Artifacts ---
    async fn insert_symptom_check(&self, check: &SymptomCheck) -> PortResult<()>;

    async fn insert_upload(&self, upload: &UploadSummary) -> PortResult<()>;

    async fn recent_symptom_checks(&self, user_id: Uuid, limit: i64)
        -> PortResult<Vec<SymptomCheck>>;

    async fn recent_uploads(&self, user_id: Uuid, limit: i64) -> PortResult<Vec<UploadSummary>>;

    /// Looks up an upload by storage key, scoped to its owner.
    async fn find_upload(
        &self,
        user_id: Uuid,
        storage_key: &str,
    ) -> PortResult<Option<UploadSummary>>;
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generates text for a prompt, optionally conditioned on an image.
    ///
    /// Returns `Ok(None)` when the model answered without any textual content.
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<&ImageAttachment>,
    ) -> PortResult<Option<String>>;
}

//! crates/health_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Read-only Context Entities
//=========================================================================================

/// A user-managed reminder. The pipeline only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub title: String,
    pub scheduled_time: DateTime<Utc>,
    pub description: String,
}

//=========================================================================================
// Ingest Requests
//=========================================================================================

/// The file type inferred from an uploaded filename's suffix.
///
/// This is the single allow-list for uploads: every call site dispatches on
/// this enum instead of inspecting suffixes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredKind {
    Pdf,
    Image,
    Rejected,
}

impl DeclaredKind {
    /// Classifies a filename by its (case-insensitive) suffix. A name that is
    /// only the suffix, such as `.pdf`, still counts.
    pub fn from_filename(filename: &str) -> Self {
        let name = filename.to_ascii_lowercase();
        if name.ends_with(".pdf") {
            DeclaredKind::Pdf
        } else if [".png", ".jpg", ".jpeg"].iter().any(|s| name.ends_with(s)) {
            DeclaredKind::Image
        } else {
            DeclaredKind::Rejected
        }
    }
}

/// A file that passed the upload gate.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub kind: DeclaredKind,
    /// The content type the client declared for the multipart part.
    pub content_type: String,
    pub bytes: Bytes,
}

/// One validated inbound request. Exactly one variant per pipeline invocation.
#[derive(Debug, Clone)]
pub enum IngestRequest {
    ChatMessage(String),
    SymptomQuery(String),
    ProblemQuery(String),
    DocumentUpload(DocumentUpload),
}

impl IngestRequest {
    /// A short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            IngestRequest::ChatMessage(_) => "caretaker_chat",
            IngestRequest::SymptomQuery(_) => "symptom_check",
            IngestRequest::ProblemQuery(_) => "medicine_recommendation",
            IngestRequest::DocumentUpload(_) => "document_summary",
        }
    }
}

//=========================================================================================
// Transient Pipeline Values
//=========================================================================================

/// A binary image ready to be sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Subtype taken from the decoded image format, e.g. `png` or `jpeg`.
    pub mime_subtype: String,
    pub data: Bytes,
}

impl ImageAttachment {
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.mime_subtype)
    }
}

/// The normalized content of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    Text(String),
    Image(ImageAttachment),
}

/// Text produced by the generative capability for one request.
#[derive(Debug, Clone)]
pub struct GeneratedResult {
    pub text: String,
    pub produced_at: DateTime<Utc>,
}

//=========================================================================================
// Persisted Artifacts
//=========================================================================================

/// A stored symptom check and the guidance generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomCheck {
    pub user_id: Uuid,
    pub symptoms: String,
    pub result: String,
    pub checked_at: DateTime<Utc>,
}

/// A stored upload summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub user_id: Uuid,
    pub filename: String,
    pub content_type: String,
    /// Name of the stored file inside the upload directory.
    pub storage_key: String,
    pub summary: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Everything the pipeline may persist. Only created after a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredArtifact {
    SymptomCheck(SymptomCheck),
    UploadSummary(UploadSummary),
}

impl StoredArtifact {
    pub fn user_id(&self) -> Uuid {
        match self {
            StoredArtifact::SymptomCheck(check) => check.user_id,
            StoredArtifact::UploadSummary(upload) => upload.user_id,
        }
    }
}

/// A per-user overview of recent activity.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub reminders: Vec<Reminder>,
    pub symptom_checks: Vec<SymptomCheck>,
    pub uploads: Vec<UploadSummary>,
}

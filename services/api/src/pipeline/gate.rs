//! services/api/src/pipeline/gate.rs
//!
//! Preconditions every pipeline entry point must pass before any side effect:
//! a resolvable session and non-empty required fields.

use bytes::Bytes;
use health_assistant_core::{
    domain::{DeclaredKind, DocumentUpload},
    ports::DatabaseService,
};
use tracing::error;
use uuid::Uuid;

use crate::error::PipelineError;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Column widths of `uploads.file_name` and `uploads.file_type`.
pub const MAX_FILENAME_CHARS: usize = 255;
pub const MAX_CONTENT_TYPE_CHARS: usize = 100;

/// Resolves a session token to its user.
///
/// A store failure is logged and treated like an unknown session.
pub async fn resolve_session(
    db: &dyn DatabaseService,
    session_token: Option<&str>,
) -> Result<Uuid, PipelineError> {
    let token = session_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(PipelineError::Unauthorized)?;

    match db.resolve_session(token).await {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(PipelineError::Unauthorized),
        Err(e) => {
            error!("Failed to resolve auth session: {:?}", e);
            Err(PipelineError::Unauthorized)
        }
    }
}

/// Pulls the `session` value out of a `Cookie` header.
pub fn session_token_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
}

/// Returns the field value as sent, or `BadInput` with `missing_message` when
/// it is absent or only whitespace.
pub fn required_text(value: Option<&str>, missing_message: &str) -> Result<String, PipelineError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::bad_input(missing_message))
}

/// A file part as received from the client, before validation.
#[derive(Debug, Default)]
pub struct RawUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Validates an upload and classifies it. Nothing is written here.
pub fn validate_upload(raw: Option<RawUpload>) -> Result<DocumentUpload, PipelineError> {
    let raw = raw.ok_or_else(|| PipelineError::bad_input("No file uploaded"))?;

    let filename = raw
        .filename
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| PipelineError::bad_input("No file selected"))?;

    let kind = DeclaredKind::from_filename(&filename);
    if kind == DeclaredKind::Rejected {
        return Err(PipelineError::bad_input("Invalid file type"));
    }

    if filename.chars().count() > MAX_FILENAME_CHARS {
        return Err(PipelineError::bad_input(format!(
            "File name must be at most {} characters",
            MAX_FILENAME_CHARS
        )));
    }

    if raw.bytes.is_empty() {
        return Err(PipelineError::bad_input("The uploaded file is empty"));
    }

    // The declared type is informational only, so an unusable one is replaced.
    let content_type = raw
        .content_type
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && c.chars().count() <= MAX_CONTENT_TYPE_CHARS)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    Ok(DocumentUpload {
        filename,
        kind,
        content_type,
        bytes: raw.bytes,
    })
}

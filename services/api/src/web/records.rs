//! services/api/src/web/records.rs
//!
//! Handlers over the user's stored records: reminders, the dashboard view and
//! downloads of previously uploaded files.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use health_assistant_core::domain::{Dashboard, Reminder, SymptomCheck, UploadSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::pipeline::{gate, UploadStore};
use crate::web::{error_reply, state::AppState};

const DASHBOARD_REMINDERS: i64 = 5;
const DASHBOARD_SYMPTOM_CHECKS: i64 = 3;
const DASHBOARD_UPLOADS: i64 = 3;
/// Column width of `reminders.title`.
const MAX_TITLE_CHARS: usize = 100;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema, Default)]
pub struct AddReminderRequest {
    #[serde(default)]
    pub title: Option<String>,
    /// RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReminderView {
    pub title: String,
    pub scheduled_time: DateTime<Utc>,
    pub description: String,
}

#[derive(Serialize, ToSchema)]
pub struct SymptomCheckView {
    pub symptoms: String,
    pub result: String,
    pub checked_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadView {
    pub filename: String,
    pub content_type: String,
    pub storage_key: String,
    pub summary: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub reminders: Vec<ReminderView>,
    pub symptom_checks: Vec<SymptomCheckView>,
    pub uploads: Vec<UploadView>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            reminders: d.reminders.into_iter().map(Into::into).collect(),
            symptom_checks: d.symptom_checks.into_iter().map(Into::into).collect(),
            uploads: d.uploads.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Reminder> for ReminderView {
    fn from(r: Reminder) -> Self {
        Self {
            title: r.title,
            scheduled_time: r.scheduled_time,
            description: r.description,
        }
    }
}

impl From<SymptomCheck> for SymptomCheckView {
    fn from(c: SymptomCheck) -> Self {
        Self {
            symptoms: c.symptoms,
            result: c.result,
            checked_at: c.checked_at,
        }
    }
}

impl From<UploadSummary> for UploadView {
    fn from(u: UploadSummary) -> Self {
        Self {
            filename: u.filename,
            content_type: u.content_type,
            storage_key: u.storage_key,
            summary: u.summary,
            uploaded_at: u.uploaded_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /reminders - Schedule a reminder for the current user
#[utoipa::path(
    post,
    path = "/reminders",
    request_body = AddReminderRequest,
    responses(
        (status = 201, description = "Reminder stored", body = MessageResponse),
        (status = 400, description = "Missing field or unreadable date_time"),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Reminder could not be stored")
    )
)]
pub async fn add_reminder_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<AddReminderRequest>, JsonRejection>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let reminder = match reminder_from_request(payload) {
        Ok(reminder) => reminder,
        Err(e) => return error_reply(e, "message"),
    };

    match state.db.create_reminder(user_id, &reminder).await {
        Ok(()) => {
            info!("Added reminder for user {} at {}", user_id, reminder.scheduled_time);
            (
                StatusCode::CREATED,
                Json(MessageResponse {
                    message: "Reminder added successfully".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to add reminder for user {}: {:?}", user_id, e);
            error_reply(PipelineError::from(e), "message")
        }
    }
}

/// GET /dashboard - Upcoming reminders and the latest stored results
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard contents", body = DashboardResponse),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Records could not be loaded")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Response {
    let db = &state.db;
    let loaded = tokio::try_join!(
        db.upcoming_reminders(user_id, Utc::now(), DASHBOARD_REMINDERS),
        db.recent_symptom_checks(user_id, DASHBOARD_SYMPTOM_CHECKS),
        db.recent_uploads(user_id, DASHBOARD_UPLOADS),
    );

    match loaded {
        Ok((reminders, symptom_checks, uploads)) => {
            let dashboard = Dashboard {
                reminders,
                symptom_checks,
                uploads,
            };
            (StatusCode::OK, Json(DashboardResponse::from(dashboard))).into_response()
        }
        Err(e) => {
            error!("Failed to load dashboard for user {}: {:?}", user_id, e);
            error_reply(PipelineError::from(e), "message")
        }
    }
}

/// GET /uploads/{storage_key} - Download a file the current user uploaded
#[utoipa::path(
    get,
    path = "/uploads/{storage_key}",
    params(
        ("storage_key" = String, Path, description = "Key returned on the dashboard for the upload.")
    ),
    responses(
        (status = 200, description = "The stored file"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "No such upload for this user"),
        (status = 500, description = "File could not be read")
    )
)]
pub async fn download_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(storage_key): Path<String>,
) -> Response {
    if !UploadStore::is_valid_key(&storage_key) {
        return not_found();
    }

    let upload = match state.db.find_upload(user_id, &storage_key).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return not_found(),
        Err(e) => {
            error!("Failed to look up upload {} for user {}: {:?}", storage_key, user_id, e);
            return error_reply(PipelineError::from(e), "message");
        }
    };

    let bytes = match state.pipeline.uploads().read(&upload.storage_key).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read stored file {}: {}", upload.storage_key, e);
            return error_reply(e, "message");
        }
    };

    let content_type = HeaderValue::from_str(&upload.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(gate::DEFAULT_CONTENT_TYPE));
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

//=========================================================================================
// Helpers
//=========================================================================================

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

fn reminder_from_request(payload: AddReminderRequest) -> Result<Reminder, PipelineError> {
    const MISSING: &str = "All fields are required";
    let title = gate::required_text(payload.title.as_deref(), MISSING)?;
    let date_time = gate::required_text(payload.date_time.as_deref(), MISSING)?;
    let description = gate::required_text(payload.description.as_deref(), MISSING)?;

    let title = title.trim();
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(PipelineError::bad_input(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }

    let scheduled_time = parse_reminder_time(date_time.trim())
        .ok_or_else(|| PipelineError::bad_input("Invalid date_time format"))?;

    Ok(Reminder {
        title: title.to_string(),
        scheduled_time,
        description: description.trim().to_string(),
    })
}

/// Accepts RFC 3339 timestamps and the zone-less form browsers send for
/// `datetime-local` inputs, which is read as UTC.
pub fn parse_reminder_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

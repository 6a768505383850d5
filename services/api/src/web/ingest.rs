//! services/api/src/web/ingest.rs
//!
//! HTTP entry points of the ingestion pipeline. Each handler runs the request
//! gate, builds one `IngestRequest` and hands it to the shared pipeline.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use health_assistant_core::domain::IngestRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::pipeline::{
    gate::{self, RawUpload},
    PipelineReply,
};
use crate::web::{error_reply, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct MedicineRequest {
    #[serde(default)]
    pub problem: Option<String>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct SymptomRequest {
    #[serde(default)]
    pub symptoms: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TextResponse {
    pub response: String,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub summary: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /virtual_caretaker - Empathetic guidance grounded on the next reminder
#[utoipa::path(
    post,
    path = "/virtual_caretaker",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Generated response", body = TextResponse),
        (status = 400, description = "Missing message"),
        (status = 401, description = "No valid session"),
        (status = 502, description = "Generative model unavailable")
    )
)]
pub async fn virtual_caretaker_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let request = gate::required_text(payload.message.as_deref(), "Please enter a message")
        .map(IngestRequest::ChatMessage);
    run_text_request(&state, user_id, request).await
}

/// POST /medicine_recommender - Medicine and prevention suggestions for a health problem
#[utoipa::path(
    post,
    path = "/medicine_recommender",
    request_body = MedicineRequest,
    responses(
        (status = 200, description = "Generated response", body = TextResponse),
        (status = 400, description = "Missing problem"),
        (status = 401, description = "No valid session"),
        (status = 502, description = "Generative model unavailable")
    )
)]
pub async fn medicine_recommender_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<MedicineRequest>, JsonRejection>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let request = gate::required_text(
        payload.problem.as_deref(),
        "Please describe the health problem",
    )
    .map(IngestRequest::ProblemQuery);
    run_text_request(&state, user_id, request).await
}

/// POST /symptom_checker - Possible causes and actions; the result is stored
#[utoipa::path(
    post,
    path = "/symptom_checker",
    request_body = SymptomRequest,
    responses(
        (status = 200, description = "Generated and stored response", body = TextResponse),
        (status = 400, description = "Missing symptoms"),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Result could not be stored"),
        (status = 502, description = "Generative model unavailable")
    )
)]
pub async fn symptom_checker_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    payload: Result<Json<SymptomRequest>, JsonRejection>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let request = gate::required_text(payload.symptoms.as_deref(), "Please enter symptoms")
        .map(IngestRequest::SymptomQuery);
    run_text_request(&state, user_id, request).await
}

/// POST /upload_report - Summarize an uploaded PDF or image; the summary is stored
#[utoipa::path(
    post,
    path = "/upload_report",
    request_body(content_type = "multipart/form-data", description = "A `file` part ending in .pdf, .png, .jpg or .jpeg."),
    responses(
        (status = 200, description = "File stored and summarized", body = UploadResponse),
        (status = 400, description = "Missing file or invalid file type"),
        (status = 401, description = "No valid session"),
        (status = 422, description = "File could not be read"),
        (status = 500, description = "Summary could not be stored"),
        (status = 502, description = "Generative model unavailable")
    )
)]
pub async fn upload_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match read_file_part(multipart).await.and_then(gate::validate_upload) {
        Ok(upload) => upload,
        Err(e) => return error_reply(e, "message"),
    };

    match state
        .pipeline
        .run(user_id, IngestRequest::DocumentUpload(upload))
        .await
    {
        Ok(PipelineReply::UploadSummarized { message, summary }) => {
            (StatusCode::OK, Json(UploadResponse { message, summary })).into_response()
        }
        Ok(other) => mismatched_reply(other, "message"),
        Err(e) => error_reply(e, "message"),
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn run_text_request(
    state: &AppState,
    user_id: Uuid,
    request: Result<IngestRequest, PipelineError>,
) -> Response {
    let request = match request {
        Ok(request) => request,
        Err(e) => return error_reply(e, "response"),
    };

    match state.pipeline.run(user_id, request).await {
        Ok(PipelineReply::Response(response)) => {
            (StatusCode::OK, Json(TextResponse { response })).into_response()
        }
        Ok(other) => mismatched_reply(other, "response"),
        Err(e) => error_reply(e, "response"),
    }
}

/// A reply shape the endpoint never produces means the request was routed wrongly.
fn mismatched_reply(reply: PipelineReply, field: &'static str) -> Response {
    error!("Pipeline produced a reply this endpoint cannot return: {:?}", reply);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ field: "Something went wrong while processing your request." })),
    )
        .into_response()
}

/// Finds the `file` part of a multipart body. A body that is not multipart at
/// all is treated the same as one without a file.
async fn read_file_part(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<RawUpload>, PipelineError> {
    let Ok(mut multipart) = multipart else {
        return Ok(None);
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::bad_input(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PipelineError::bad_input(format!("Failed to read file bytes: {}", e)))?;
        return Ok(Some(RawUpload {
            filename,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn wrong_reply_shape_is_an_internal_error_without_the_text() {
        let reply = PipelineReply::UploadSummarized {
            message: "File uploaded and summarized".to_string(),
            summary: "GENERATED SUMMARY".to_string(),
        };
        let response = mismatched_reply(reply, "response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body["response"].is_string());
        assert!(!body.to_string().contains("GENERATED SUMMARY"));
    }
}

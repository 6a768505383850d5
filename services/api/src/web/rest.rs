//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the public
//! liveness endpoint.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{ingest, records};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        ingest::virtual_caretaker_handler,
        ingest::medicine_recommender_handler,
        ingest::symptom_checker_handler,
        ingest::upload_report_handler,
        records::add_reminder_handler,
        records::dashboard_handler,
        records::download_upload_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ingest::ChatRequest,
            ingest::MedicineRequest,
            ingest::SymptomRequest,
            ingest::TextResponse,
            ingest::UploadResponse,
            records::AddReminderRequest,
            records::MessageResponse,
            records::ReminderView,
            records::SymptomCheckView,
            records::UploadView,
            records::DashboardResponse,
        )
    ),
    tags(
        (name = "Health Assistant API", description = "Caretaker chat, medicine suggestions, symptom checks and report summaries.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe. Needs no session.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

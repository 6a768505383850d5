pub mod ingest;
pub mod middleware;
pub mod records;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::PipelineError;

pub use middleware::require_auth;
use rest::ApiDoc;
use state::AppState;

/// Builds the full application router: public routes, session-protected
/// routes, body limit, CORS and the Swagger UI.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_allowed_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let public_routes = Router::new().route("/health", get(rest::health_handler));

    let protected_routes = Router::new()
        .route("/virtual_caretaker", post(ingest::virtual_caretaker_handler))
        .route("/medicine_recommender", post(ingest::medicine_recommender_handler))
        .route("/symptom_checker", post(ingest::symptom_checker_handler))
        .route("/upload_report", post(ingest::upload_report_handler))
        .route("/reminders", post(records::add_reminder_handler))
        .route("/dashboard", get(records::dashboard_handler))
        .route("/uploads/{storage_key}", get(records::download_upload_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Maps a pipeline failure to its status code and a JSON body whose message
/// sits under `field`. Unauthorized always uses the fixed auth body.
pub(crate) fn error_reply(err: PipelineError, field: &'static str) -> Response {
    let status = match &err {
        PipelineError::Unauthorized => return middleware::unauthorized(),
        PipelineError::BadInput(_) => StatusCode::BAD_REQUEST,
        PipelineError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        PipelineError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ field: err.client_message() }))).into_response()
}

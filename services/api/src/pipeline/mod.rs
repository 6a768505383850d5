//! services/api/src/pipeline/mod.rs
//!
//! The ingestion pipeline: extraction, context, prompt, generation and routing
//! for one validated request.

pub mod context;
pub mod extract;
pub mod gate;
pub mod invoker;
pub mod router;
pub mod uploads;

use std::sync::Arc;

use chrono::Utc;
use health_assistant_core::{
    domain::{DeclaredKind, DocumentUpload, ExtractedContent, IngestRequest},
    ports::{DatabaseService, GenerativeModel},
    prompts::{compose, PromptInput},
};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::PipelineError;

pub use context::ContextAssembler;
pub use invoker::{GenerativeInvoker, FALLBACK_TEXT};
pub use router::{PipelineReply, ResultRouter, Routing};
pub use uploads::UploadStore;

/// Runs one request through every stage. Holds no per-request state, so a
/// single instance is shared by all handlers.
#[derive(Clone)]
pub struct Pipeline {
    context: ContextAssembler,
    invoker: GenerativeInvoker,
    router: ResultRouter,
    uploads: UploadStore,
}

impl Pipeline {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        model: Arc<dyn GenerativeModel>,
        uploads: UploadStore,
    ) -> Self {
        Self {
            context: ContextAssembler::new(db.clone()),
            invoker: GenerativeInvoker::new(model),
            router: ResultRouter::new(db),
            uploads,
        }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub async fn run(
        &self,
        user_id: Uuid,
        request: IngestRequest,
    ) -> Result<PipelineReply, PipelineError> {
        info!("Running {} pipeline for user {}", request.label(), user_id);

        match request {
            IngestRequest::ChatMessage(message) => {
                let context = self.context.assemble(user_id, Utc::now()).await?;
                let prompt = compose(PromptInput::CaretakerChat {
                    message: &message,
                    context: &context,
                });
                let result = self.invoker.invoke(&prompt, None).await?;
                self.router.route(user_id, Routing::Transient, result).await
            }
            IngestRequest::ProblemQuery(problem) => {
                let prompt = compose(PromptInput::MedicineRecommendation { problem: &problem });
                let result = self.invoker.invoke(&prompt, None).await?;
                self.router.route(user_id, Routing::Transient, result).await
            }
            IngestRequest::SymptomQuery(symptoms) => {
                let prompt = compose(PromptInput::SymptomCheck { symptoms: &symptoms });
                let result = self.invoker.invoke(&prompt, None).await?;
                self.router
                    .route(user_id, Routing::SymptomCheck { symptoms }, result)
                    .await
            }
            IngestRequest::DocumentUpload(upload) => self.summarize_upload(user_id, upload).await,
        }
    }

    async fn summarize_upload(
        &self,
        user_id: Uuid,
        upload: DocumentUpload,
    ) -> Result<PipelineReply, PipelineError> {
        if upload.kind == DeclaredKind::Rejected {
            return Err(PipelineError::bad_input("Invalid file type"));
        }

        let storage_key = UploadStore::storage_key(user_id, &upload.filename, &upload.bytes);
        self.uploads.save(&storage_key, &upload.bytes).await?;

        // The stored file stays in place if extraction fails.
        let content = extract::extract_blocking(upload.kind, upload.bytes.clone())
            .await
            .map_err(|e| {
                error!(
                    "Extraction failed for upload '{}' (key {}) of user {}: {}",
                    upload.filename, storage_key, user_id, e
                );
                e
            })?;

        let result = match &content {
            ExtractedContent::Text(text) => {
                let prompt = compose(PromptInput::DocumentText { text });
                self.invoker.invoke(&prompt, None).await?
            }
            ExtractedContent::Image(attachment) => {
                let prompt = compose(PromptInput::DocumentImage);
                self.invoker.invoke(&prompt, Some(attachment)).await?
            }
        };

        let routing = Routing::UploadSummary {
            filename: upload.filename,
            content_type: upload.content_type,
            storage_key,
        };
        self.router.route(user_id, routing, result).await
    }
}

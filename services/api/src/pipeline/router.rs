//! services/api/src/pipeline/router.rs
//!
//! Decides what happens to a generated result: returned as-is, or persisted
//! first and then returned.

use std::sync::Arc;

use health_assistant_core::{
    domain::{GeneratedResult, StoredArtifact, SymptomCheck, UploadSummary},
    ports::DatabaseService,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::PipelineError;

pub const UPLOAD_CONFIRMATION: &str = "File uploaded and summarized";

/// Where a generated result goes once the model has answered.
#[derive(Debug, Clone)]
pub enum Routing {
    /// Caretaker chat and medicine recommendations are never stored.
    Transient,
    SymptomCheck {
        symptoms: String,
    },
    UploadSummary {
        filename: String,
        content_type: String,
        storage_key: String,
    },
}

/// What the caller receives for a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineReply {
    Response(String),
    UploadSummarized { message: String, summary: String },
}

#[derive(Clone)]
pub struct ResultRouter {
    db: Arc<dyn DatabaseService>,
}

impl ResultRouter {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Persists the artifact for `routing`, if any, then builds the reply.
    ///
    /// If the write fails the generated text is withheld and the storage error
    /// is returned instead.
    pub async fn route(
        &self,
        user_id: Uuid,
        routing: Routing,
        result: GeneratedResult,
    ) -> Result<PipelineReply, PipelineError> {
        match routing {
            Routing::Transient => Ok(PipelineReply::Response(result.text)),
            Routing::SymptomCheck { symptoms } => {
                let artifact = StoredArtifact::SymptomCheck(SymptomCheck {
                    user_id,
                    symptoms,
                    result: result.text.clone(),
                    checked_at: result.produced_at,
                });
                self.persist(&artifact).await?;
                Ok(PipelineReply::Response(result.text))
            }
            Routing::UploadSummary {
                filename,
                content_type,
                storage_key,
            } => {
                let artifact = StoredArtifact::UploadSummary(UploadSummary {
                    user_id,
                    filename,
                    content_type,
                    storage_key,
                    summary: result.text.clone(),
                    uploaded_at: result.produced_at,
                });
                self.persist(&artifact).await?;
                Ok(PipelineReply::UploadSummarized {
                    message: UPLOAD_CONFIRMATION.to_string(),
                    summary: result.text,
                })
            }
        }
    }

    async fn persist(&self, artifact: &StoredArtifact) -> Result<(), PipelineError> {
        let written = match artifact {
            StoredArtifact::SymptomCheck(check) => self.db.insert_symptom_check(check).await,
            StoredArtifact::UploadSummary(upload) => self.db.insert_upload(upload).await,
        };

        match written {
            Ok(()) => {
                info!("Stored artifact for user {}", artifact.user_id());
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to store artifact for user {} after successful generation: {:?}",
                    artifact.user_id(),
                    e
                );
                Err(PipelineError::from(e))
            }
        }
    }
}

//! services/api/src/pipeline/context.rs
//!
//! Gathers the grounding fact for caretaker chat prompts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use health_assistant_core::{context::ContextFact, ports::DatabaseService};
use tracing::error;
use uuid::Uuid;

use crate::error::PipelineError;

/// Reads the user's nearest upcoming reminder. Nothing is remembered between calls.
#[derive(Clone)]
pub struct ContextAssembler {
    db: Arc<dyn DatabaseService>,
}

impl ContextAssembler {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn assemble(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ContextFact, PipelineError> {
        let next = self
            .db
            .next_upcoming_reminder(user_id, now)
            .await
            .map_err(|e| {
                error!("Failed to load next reminder for user {}: {:?}", user_id, e);
                PipelineError::from(e)
            })?;
        Ok(ContextFact::from_next_reminder(next.as_ref()))
    }
}

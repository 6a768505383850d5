//! services/api/src/pipeline/invoker.rs
//!
//! The single call site for the generative model. Timeouts and retry policy
//! belong here; today every request makes exactly one attempt.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use health_assistant_core::{
    domain::{GeneratedResult, ImageAttachment},
    ports::GenerativeModel,
};
use tracing::{debug, error, info};

use crate::error::PipelineError;

/// Returned to the caller when the model answers without any text.
pub const FALLBACK_TEXT: &str = "Unable to generate response.";

#[derive(Clone)]
pub struct GenerativeInvoker {
    model: Arc<dyn GenerativeModel>,
}

impl GenerativeInvoker {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn invoke(
        &self,
        prompt: &str,
        attachment: Option<&ImageAttachment>,
    ) -> Result<GeneratedResult, PipelineError> {
        debug!("Calling generative model with prompt: {}", prompt);
        let started = Instant::now();

        let text = self.model.generate(prompt, attachment).await.map_err(|e| {
            error!("Generative model call failed: {}", e);
            PipelineError::GenerationFailed(e.to_string())
        })?;
        info!("⏱️ Generation took: {:?}", started.elapsed());

        let text = match text {
            Some(text) => text,
            None => {
                error!("Generative model returned no text content; using fallback response");
                FALLBACK_TEXT.to_string()
            }
        };

        Ok(GeneratedResult {
            text,
            produced_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use health_assistant_core::ports::{PortError, PortResult};

    struct Scripted(std::sync::Mutex<Option<PortResult<Option<String>>>>);

    #[async_trait]
    impl GenerativeModel for Scripted {
        async fn generate(
            &self,
            _prompt: &str,
            _attachment: Option<&ImageAttachment>,
        ) -> PortResult<Option<String>> {
            self.0.lock().unwrap().take().expect("one scripted reply")
        }
    }

    fn invoker(reply: PortResult<Option<String>>) -> GenerativeInvoker {
        GenerativeInvoker::new(Arc::new(Scripted(std::sync::Mutex::new(Some(reply)))))
    }

    #[tokio::test]
    async fn returns_model_text() {
        let result = invoker(Ok(Some("Rest well".to_string())))
            .invoke("prompt", None)
            .await
            .unwrap();
        assert_eq!(result.text, "Rest well");
    }

    #[tokio::test]
    async fn missing_text_degrades_to_fallback() {
        let result = invoker(Ok(None)).invoke("prompt", None).await.unwrap();
        assert_eq!(result.text, FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn call_failures_surface_as_generation_failed() {
        let err = invoker(Err(PortError::Unexpected("quota exceeded".to_string())))
            .invoke("prompt", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::GenerationFailed(ref m) if m.contains("quota exceeded")));
    }
}

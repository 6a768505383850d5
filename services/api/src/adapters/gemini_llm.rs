//! services/api/src/adapters/gemini_llm.rs
//!
//! This module contains the adapter for the generative model.
//! It implements the `GenerativeModel` port from the `core` crate by talking to
//! Gemini through its OpenAI-compatible chat completions endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use health_assistant_core::{
    domain::ImageAttachment,
    ports::{GenerativeModel, PortError, PortResult},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeModel` using an OpenAI-compatible Gemini endpoint.
///
/// The underlying client is stateless per call and cheap to clone, so one
/// instance is shared by every request.
#[derive(Clone)]
pub struct GeminiAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiAdapter {
    /// Creates a new `GeminiAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds a client pointed at the given OpenAI-compatible base URL.
    pub fn client_for(api_base: &str, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Client::with_config(config)
    }

    fn user_content(
        prompt: &str,
        attachment: Option<&ImageAttachment>,
    ) -> PortResult<ChatCompletionRequestUserMessageContent> {
        let Some(attachment) = attachment else {
            return Ok(ChatCompletionRequestUserMessageContent::Text(prompt.to_string()));
        };

        let text_part: ChatCompletionRequestUserMessageContentPart =
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into();

        let image_part: ChatCompletionRequestUserMessageContentPart =
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(to_data_url(attachment))
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?,
                )
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into();

        Ok(ChatCompletionRequestUserMessageContent::Array(vec![
            text_part, image_part,
        ]))
    }
}

/// Encodes an image as an inline `data:` URL.
fn to_data_url(attachment: &ImageAttachment) -> String {
    format!(
        "data:{};base64,{}",
        attachment.mime_type(),
        BASE64_STANDARD.encode(&attachment.data)
    )
}

//=========================================================================================
// `GenerativeModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeModel for GeminiAdapter {
    async fn generate(
        &self,
        prompt: &str,
        attachment: Option<&ImageAttachment>,
    ) -> PortResult<Option<String>> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(Self::user_content(prompt, attachment)?)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // No choices or an empty message both count as "no textual content".
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn data_url_carries_mime_and_base64_payload() {
        let attachment = ImageAttachment {
            mime_subtype: "png".to_string(),
            data: Bytes::from_static(b"abc"),
        };
        assert_eq!(to_data_url(&attachment), "data:image/png;base64,YWJj");
    }

    #[test]
    fn text_only_requests_use_plain_content() {
        let content = GeminiAdapter::user_content("hello", None).unwrap();
        assert!(matches!(content, ChatCompletionRequestUserMessageContent::Text(ref t) if t == "hello"));
    }

    #[test]
    fn image_requests_send_text_and_image_parts() {
        let attachment = ImageAttachment {
            mime_subtype: "jpeg".to_string(),
            data: Bytes::from_static(b"\xff\xd8\xff"),
        };
        let content = GeminiAdapter::user_content("describe", Some(&attachment)).unwrap();
        match content {
            ChatCompletionRequestUserMessageContent::Array(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected multipart content, got {:?}", other),
        }
    }
}

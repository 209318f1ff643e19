//! Optional spelling/grammar pass over recognized text
//!
//! Revision is best effort: [`revise_or_original`] never fails, it logs and
//! hands back the input when the service misbehaves.

use crate::config::RevisionConfig;
use crate::error::OcrError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You correct text produced by OCR. Fix spelling, grammar and \
obvious character recognition mistakes. Keep the original meaning, language, line breaks \
and formatting. Reply with the corrected text only.";

#[async_trait]
pub trait TextReviser: Send + Sync {
    /// Short identifier for logs and `/info`
    fn name(&self) -> &'static str;

    async fn revise(&self, text: &str) -> Result<String, OcrError>;
}

/// Used when no revision endpoint is configured
pub struct NoopReviser;

#[async_trait]
impl TextReviser for NoopReviser {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn revise(&self, text: &str) -> Result<String, OcrError> {
        Ok(text.to_string())
    }
}

/// OpenAI-compatible chat completion client
pub struct HttpReviser {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl HttpReviser {
    pub fn new(config: &RevisionConfig) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                OcrError::InitializationError(format!("Failed to create revision client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextReviser for HttpReviser {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn revise(&self, text: &str) -> Result<String, OcrError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OcrError::RevisionServiceFailure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OcrError::RevisionServiceFailure(format!(
                "service returned {}",
                status
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            OcrError::RevisionServiceFailure(format!("invalid response body: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| OcrError::RevisionServiceFailure("empty completion".to_string()))
    }
}

/// Build the reviser for this deployment
pub fn build_reviser(config: Option<&RevisionConfig>) -> Result<Arc<dyn TextReviser>, OcrError> {
    match config {
        Some(config) => {
            tracing::info!(url = %config.base_url, model = %config.model, "Text revision enabled");
            Ok(Arc::new(HttpReviser::new(config)?))
        }
        None => Ok(Arc::new(NoopReviser)),
    }
}

/// Revise `text`, falling back to it unchanged on any failure
pub async fn revise_or_original(reviser: &dyn TextReviser, text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    match reviser.revise(text).await {
        Ok(revised) => revised,
        Err(e) => {
            tracing::warn!(
                reviser = reviser.name(),
                error = %e,
                text_len = text.len(),
                "Text revision failed, returning original text"
            );
            text.to_string()
        }
    }
}

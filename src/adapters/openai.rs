//! OpenAI chat completions adapter.
//!
//! Endpoint: POST {base}/v1/chat/completions
//! Auth: Bearer token

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, GenerateError, Generator, GeneratorOutput};
use crate::config::ProviderSettings;

/// OpenAI chat completions client
pub struct OpenAiGenerator {
    api_key: String,
    settings: ProviderSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiGenerator {
    /// Create a new client
    pub fn new(
        api_key: String,
        settings: ProviderSettings,
        timeout: Option<Duration>,
    ) -> Result<Self, GenerateError> {
        Ok(Self {
            api_key,
            settings,
            client: http_client(timeout)?,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/v1/chat/completions", self.settings.base_url)
    }

    fn request_body<'a>(&'a self, system: &'a str, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        }
    }
}

fn parse_response(body: &str) -> Result<GeneratorOutput, GenerateError> {
    let response: ChatResponse = serde_json::from_str(body)?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerateError::EmptyContent {
            provider: "openai".to_string(),
        });
    }

    Ok(GeneratorOutput {
        content: text,
        tokens_used: response.usage.and_then(|u| u.total_tokens),
    })
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<GeneratorOutput, GenerateError> {
        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(system, prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let output = parse_response(&body)?;
        debug!(model = %self.settings.model, tokens = ?output.tokens_used, "OpenAI call succeeded");
        Ok(output)
    }
}

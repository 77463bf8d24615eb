//! Gemini generateContent adapter.
//!
//! Endpoint: POST {base}/v1beta/models/{model}:generateContent
//! Auth: x-goog-api-key header

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, GenerateError, Generator, GeneratorOutput};
use crate::config::ProviderSettings;

/// Gemini REST client
pub struct GeminiGenerator {
    api_key: String,
    settings: ProviderSettings,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiGenerator {
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

    /// Build API URL
    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }
}

fn request_body<'a>(system: &'a str, prompt: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part { text: system }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: prompt }],
        }],
    }
}

/// Extract the reply text from a successful response body
fn parse_response(body: &str) -> Result<GeneratorOutput, GenerateError> {
    let response: GenerateResponse = serde_json::from_str(body)?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerateError::EmptyContent {
            provider: "gemini".to_string(),
        });
    }

    Ok(GeneratorOutput {
        content: text,
        tokens_used: response.usage_metadata.and_then(|u| u.total_token_count),
    })
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<GeneratorOutput, GenerateError> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(system, prompt))
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
        debug!(model = %self.settings.model, tokens = ?output.tokens_used, "Gemini call succeeded");
        Ok(output)
    }
}

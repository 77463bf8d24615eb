//! Adapter interfaces for generative text services.
//!
//! Both providers sit behind the [`Generator`] trait so the pipeline never
//! knows which one it is talking to.

pub mod gemini;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ResolvedConfig;

pub use gemini::GeminiGenerator;
pub use openai::OpenAiGenerator;

/// Errors from a generative text call
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{provider} returned empty content")]
    EmptyContent { provider: String },

    #[error("{var} environment variable is not set")]
    MissingApiKey { var: String },
}

/// Supported providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
}

impl Provider {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Openai => "OPENAI_API_KEY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Openai => "openai",
        }
    }
}

/// Output from a generator call
#[derive(Debug, Clone)]
pub struct GeneratorOutput {
    /// The text returned by the provider
    pub content: String,

    /// Tokens used (if reported)
    pub tokens_used: Option<u64>,
}

impl GeneratorOutput {
    /// Create a new output with just content
    pub fn new(content: String) -> Self {
        Self {
            content,
            tokens_used: None,
        }
    }
}

/// Trait for generative text providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Send a system instruction and a user prompt, returning the reply
    async fn generate(&self, system: &str, prompt: &str) -> Result<GeneratorOutput, GenerateError>;
}

/// Build an HTTP client with the configured timeout (none by default)
pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, GenerateError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Construct the generator for a provider, reading its key from the environment
pub fn build_generator(
    provider: Provider,
    config: &ResolvedConfig,
) -> Result<Box<dyn Generator>, GenerateError> {
    let var = provider.api_key_var();
    let api_key = std::env::var(var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| GenerateError::MissingApiKey {
            var: var.to_string(),
        })?;

    let settings = config.provider(provider).clone();
    let timeout = config.rewrite.request_timeout_seconds.map(Duration::from_secs);

    let generator: Box<dyn Generator> = match provider {
        Provider::Gemini => Box::new(GeminiGenerator::new(api_key, settings, timeout)?),
        Provider::Openai => Box::new(OpenAiGenerator::new(api_key, settings, timeout)?),
    };

    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults_to_gemini() {
        assert_eq!(Provider::default(), Provider::Gemini);
        assert_eq!(Provider::Gemini.api_key_var(), "GEMINI_API_KEY");
        assert_eq!(Provider::Openai.as_str(), "openai");
    }

    #[test]
    fn test_error_messages() {
        let err = GenerateError::Api {
            status: 429,
            message: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 429): quota");

        let err = GenerateError::MissingApiKey {
            var: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(err.to_string(), "OPENAI_API_KEY environment variable is not set");
    }
}

pub mod gemini;
pub mod openai;

use crate::domain::analysis::AnalysisRequest;
use crate::domain::error::{AnalysisFailure, AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::llm_config::LLMProvider;
use async_trait::async_trait;
use gemini::GeminiClient;
use openai::OpenAIClient;
use std::time::Duration;

#[async_trait]
pub trait LLMClient {
    /// Send one request and return the top choice's text.
    async fn complete(&self, config: &LLMConfig, request: &AnalysisRequest) -> Result<String>;
}

pub struct RouterClient {
    openai: OpenAIClient,
    gemini: GeminiClient,
}

impl RouterClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            openai: OpenAIClient::new(http.clone()),
            gemini: GeminiClient::new(http),
        })
    }
}

#[async_trait]
impl LLMClient for RouterClient {
    async fn complete(&self, config: &LLMConfig, request: &AnalysisRequest) -> Result<String> {
        match config.provider {
            LLMProvider::Google => self.gemini.complete(config, request).await,
            _ => self.openai.complete(config, request).await,
        }
    }
}

/// Map a transport failure onto the failure taxonomy
pub(crate) fn classify_transport(err: &reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        AnalysisFailure::Timeout
    } else if err.is_decode() {
        AnalysisFailure::MalformedResponse
    } else {
        AnalysisFailure::Connectivity
    };
    AppError::analysis(kind, format!("Request failed: {}", err))
}

/// Map a non-success HTTP status (and its body) onto the failure taxonomy
pub(crate) fn classify_status(status: u16, body: &str) -> AppError {
    let lowered = body.to_lowercase();
    let too_large = status == 413
        || lowered.contains("context_length_exceeded")
        || lowered.contains("maximum context length")
        || lowered.contains("too many tokens")
        || lowered.contains("request too large");

    let kind = match status {
        _ if too_large => AnalysisFailure::RequestTooLarge,
        401 | 403 => AnalysisFailure::Authentication,
        408 | 504 => AnalysisFailure::Timeout,
        429 => AnalysisFailure::RateLimited,
        _ => AnalysisFailure::Upstream,
    };

    AppError::analysis(kind, format!("API error ({}): {}", status, body))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(err: AppError) -> AnalysisFailure {
        match err {
            AppError::AnalysisService { kind, .. } => kind,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(kind_of(classify_status(401, "bad key")), AnalysisFailure::Authentication);
        assert_eq!(kind_of(classify_status(413, "")), AnalysisFailure::RequestTooLarge);
        assert_eq!(kind_of(classify_status(429, "slow down")), AnalysisFailure::RateLimited);
        assert_eq!(kind_of(classify_status(500, "oops")), AnalysisFailure::Upstream);
    }

    #[test]
    fn test_context_length_body_is_too_large() {
        let body = r#"{"error":{"code":"context_length_exceeded","message":"This model's maximum context length is 8192 tokens"}}"#;
        assert_eq!(kind_of(classify_status(400, body)), AnalysisFailure::RequestTooLarge);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.openai.com/v1/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(join_url("http://localhost:1234/v1", "models"), "http://localhost:1234/v1/models");
    }
}

use super::{classify_status, classify_transport, join_url, LLMClient};
use crate::domain::analysis::{AnalysisRequest, ChatMessage};
use crate::domain::error::{AnalysisFailure, AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

/// Client for OpenAI-compatible `chat/completions` endpoints
/// (OpenAI, OpenRouter, local servers).
pub struct OpenAIClient {
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn api_key(config: &LLMConfig) -> Result<Option<String>> {
        match (&config.api_key, config.requires_api_key()) {
            (Some(key), _) if !key.trim().is_empty() => Ok(Some(key.clone())),
            (_, false) => Ok(None),
            _ => Err(AppError::analysis(
                AnalysisFailure::Authentication,
                format!("Missing API key (set {})", config.api_key_env_var()),
            )),
        }
    }

    pub(crate) fn parse_response(body: &str) -> Result<String> {
        let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
            AppError::analysis(
                AnalysisFailure::MalformedResponse,
                format!("Failed to parse JSON: {}", e),
            )
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::analysis(
                    AnalysisFailure::MalformedResponse,
                    "Invalid response format: no choices",
                )
            })
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, config: &LLMConfig, request: &AnalysisRequest) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let url = join_url(&config.base_url, "chat/completions");

        let body = ChatCompletionRequest {
            model: &request.model_id,
            messages: request.messages(),
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };

        debug!(url = %url, model = %request.model_id, "Sending chat completion");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }

        Self::parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm_config::LLMProvider;

    #[test]
    fn test_parse_response_takes_top_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(OpenAIClient::parse_response(body).unwrap(), "first");
    }

    #[test]
    fn test_parse_response_rejects_empty_choices() {
        let err = OpenAIClient::parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            AppError::AnalysisService {
                kind: AnalysisFailure::MalformedResponse,
                ..
            }
        ));
        assert!(OpenAIClient::parse_response("<html>").is_err());
    }

    #[test]
    fn test_missing_key_is_authentication_failure() {
        let config = LLMConfig::default();
        let err = OpenAIClient::api_key(&config).unwrap_err();
        assert!(matches!(
            err,
            AppError::AnalysisService {
                kind: AnalysisFailure::Authentication,
                ..
            }
        ));

        let local = LLMConfig {
            provider: LLMProvider::Local,
            ..LLMConfig::default()
        };
        assert_eq!(OpenAIClient::api_key(&local).unwrap(), None);
    }
}

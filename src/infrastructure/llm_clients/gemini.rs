use super::{classify_status, classify_transport, LLMClient};
use crate::domain::analysis::AnalysisRequest;
use crate::domain::error::{AnalysisFailure, AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::analysis(
                    AnalysisFailure::Authentication,
                    "Missing API key for Google provider",
                )
            })
    }

    fn build_body(request: &AnalysisRequest) -> GeminiRequest {
        let system_instruction = (!request.system_prompt.trim().is_empty()).then(|| GeminiContent {
            parts: vec![GeminiPart {
                text: request.system_prompt.clone(),
            }],
            role: None,
        });

        GeminiRequest {
            system_instruction,
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.user_prompt.clone(),
                }],
                role: Some("user".to_string()),
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature as f64,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    pub(crate) fn parse_response(body: &str) -> Result<String> {
        let json: GeminiResponse = serde_json::from_str(body).map_err(|e| {
            AppError::analysis(
                AnalysisFailure::MalformedResponse,
                format!("Failed to parse JSON: {}", e),
            )
        })?;

        json.candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .ok_or_else(|| {
                AppError::analysis(AnalysisFailure::MalformedResponse, "Invalid response format")
            })
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn complete(&self, config: &LLMConfig, request: &AnalysisRequest) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let model_id = request.model_id.trim();
        let base_url = config.base_url.trim_end_matches('/');
        let url = format!("{}/{}:generateContent", base_url, model_id);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

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
    use crate::domain::analysis::AnalysisMode;

    #[test]
    fn test_body_uses_system_instruction() {
        let request = AnalysisRequest {
            mode: AnalysisMode::OpenDomain,
            system_prompt: "analyst".to_string(),
            user_prompt: "question".to_string(),
            model_id: "gemini-1.5-pro".to_string(),
            temperature: 0.2,
            max_output_tokens: 256,
            source_row_count: 0,
            total_row_count: 0,
        };

        let json = serde_json::to_value(GeminiClient::build_body(&request)).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "analyst");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "question");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"insight"}]}}]}"#;
        assert_eq!(GeminiClient::parse_response(body).unwrap(), "insight");
        assert!(GeminiClient::parse_response(r#"{"candidates":[]}"#).is_err());
    }
}

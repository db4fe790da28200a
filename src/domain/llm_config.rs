use serde::{Deserialize, Serialize};

/// Host of the Gemini `generateContent` API
pub const GEMINI_API_HOST: &str = "generativelanguage.googleapis.com";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    /// OpenAI-compatible server without authentication (LM Studio, Ollama, ...)
    Local,
    OpenAI,
    OpenRouter,
    Google,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            max_tokens: Some(1024),
            temperature: Some(0.7),
            timeout_secs: 120,
        }
    }
}

impl LLMConfig {
    pub fn max_output_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(1024)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(0.7)
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env_var(&self) -> &'static str {
        match self.provider {
            LLMProvider::Google => "GEMINI_API_KEY",
            LLMProvider::OpenRouter => "OPENROUTER_API_KEY",
            _ => "OPENAI_API_KEY",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self.provider, LLMProvider::Local)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("llm.model must not be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("llm.base_url is not an http(s) URL: {}", self.base_url));
        }
        if self.provider == LLMProvider::Google && !self.base_url.contains(GEMINI_API_HOST) {
            return Err(format!(
                "llm.base_url must point at {} for the Google provider, got {}",
                GEMINI_API_HOST, self.base_url
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err("llm.temperature must be between 0.0 and 2.0".to_string());
            }
        }
        if self.max_tokens == Some(0) {
            return Err("llm.max_tokens must be > 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("llm.timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(LLMConfig::default().validate().is_ok());
    }

    #[test]
    fn test_google_provider_rejects_openai_base_url() {
        let config = LLMConfig {
            provider: LLMProvider::Google,
            ..LLMConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains(GEMINI_API_HOST));

        let config = LLMConfig {
            provider: LLMProvider::Google,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-1.5-pro".to_string(),
            ..LLMConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}

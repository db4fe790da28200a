use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Prompt embeds the table (or filtered view) as CSV
    #[serde(alias = "data-grounded")]
    DataGrounded,
    /// Prompt carries only the user's question
    #[serde(alias = "open-domain")]
    OpenDomain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// One completion request, built fresh for every analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub mode: AnalysisMode,
    pub system_prompt: String,
    pub user_prompt: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Rows embedded in `user_prompt`
    pub source_row_count: usize,
    /// Rows in the table the caller passed in
    pub total_row_count: usize,
}

impl AnalysisRequest {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: ChatRole::System,
                content: self.system_prompt.clone(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: self.user_prompt.clone(),
            },
        ]
    }

    pub fn is_truncated(&self) -> bool {
        self.source_row_count < self.total_row_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub raw_text: String,
    /// `raw_text` with reasoning tags and excess blank lines removed
    pub cleaned_text: String,
    pub mode: AnalysisMode,
    pub source_row_count: usize,
    pub model_id: String,
}

/// Prompt strings and limits for analysis requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Rows embedded in a data-grounded prompt before truncation kicks in
    pub max_prompt_rows: usize,
    pub data_grounded_system_prompt: String,
    /// Used when the user leaves the instruction empty
    pub data_grounded_default_instruction: String,
    pub open_domain_system_prompt: String,
    /// Appended after the user's question
    pub open_domain_instruction: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_prompt_rows: 500,
            data_grounded_system_prompt: "You are an expert data analyst specializing in port and logistics performance.".to_string(),
            data_grounded_default_instruction: "Analyze the following dataset with a focus on global port performance. Provide insights on trade flows, TEU volumes, key challenges, and opportunities.".to_string(),
            open_domain_system_prompt: "You are an expert analyst of global shipping, seaports and logistics.".to_string(),
            open_domain_instruction: "Answer using your general knowledge and cite your sources.".to_string(),
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_prompt_rows == 0 {
            return Err("max_prompt_rows must be > 0".to_string());
        }
        if self.data_grounded_system_prompt.trim().is_empty()
            || self.open_domain_system_prompt.trim().is_empty()
        {
            return Err("system prompts must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_accepts_hyphenated_names() {
        let mode: AnalysisMode = serde_json::from_str("\"data-grounded\"").unwrap();
        assert_eq!(mode, AnalysisMode::DataGrounded);
        let mode: AnalysisMode = serde_json::from_str("\"open_domain\"").unwrap();
        assert_eq!(mode, AnalysisMode::OpenDomain);
    }

    #[test]
    fn test_messages_are_system_then_user() {
        let request = AnalysisRequest {
            mode: AnalysisMode::OpenDomain,
            system_prompt: "sys".to_string(),
            user_prompt: "usr".to_string(),
            model_id: "gpt-4".to_string(),
            temperature: 0.7,
            max_output_tokens: 1024,
            source_row_count: 0,
            total_row_count: 0,
        };

        let messages = request.messages();
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].content, "usr");
        assert_eq!(
            serde_json::to_value(&messages[0]).unwrap()["role"],
            "system"
        );
    }
}

// ============================================================
// ANALYSIS ORCHESTRATOR USE CASE
// ============================================================
// Builds a completion request for a table (or filtered view),
// submits it once, and cleans up the answer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::domain::analysis::{AnalysisMode, AnalysisRequest, AnalysisResult, AnalysisSettings};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::table::Table;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_analysis_text;
use crate::infrastructure::tabular::CsvParser;

pub struct AnalysisOrchestrator {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    llm_config: LLMConfig,
    settings: AnalysisSettings,
}

impl AnalysisOrchestrator {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        llm_config: LLMConfig,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            llm_client,
            llm_config,
            settings,
        }
    }

    pub fn build_request(
        &self,
        table: &Table,
        mode: AnalysisMode,
        user_query: &str,
    ) -> Result<AnalysisRequest> {
        let (system_prompt, user_prompt, source_row_count) = match mode {
            AnalysisMode::DataGrounded => self.data_grounded_prompt(table, user_query)?,
            AnalysisMode::OpenDomain => self.open_domain_prompt(user_query)?,
        };

        Ok(AnalysisRequest {
            mode,
            system_prompt,
            user_prompt,
            model_id: self.llm_config.model.clone(),
            temperature: self.llm_config.temperature(),
            max_output_tokens: self.llm_config.max_output_tokens(),
            source_row_count,
            total_row_count: table.row_count(),
        })
    }

    /// One call to the completion service. No retries.
    pub async fn submit(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let start = Instant::now();
        info!(
            mode = ?request.mode,
            model = %request.model_id,
            rows = request.source_row_count,
            truncated = request.is_truncated(),
            prompt_chars = request.user_prompt.len(),
            "Submitting analysis request"
        );

        let raw_text = match self.llm_client.complete(&self.llm_config, &request).await {
            Ok(text) => text,
            Err(e) => {
                error!(
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Analysis request failed"
                );
                return Err(e);
            }
        };

        let cleaned_text = clean_analysis_text(&raw_text);
        info!(
            response_chars = raw_text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(AnalysisResult {
            raw_text,
            cleaned_text,
            mode: request.mode,
            source_row_count: request.source_row_count,
            model_id: request.model_id,
        })
    }

    pub async fn analyze(
        &self,
        table: &Table,
        mode: AnalysisMode,
        user_query: &str,
    ) -> Result<AnalysisResult> {
        let request = self.build_request(table, mode, user_query)?;
        self.submit(request).await
    }

    fn data_grounded_prompt(&self, table: &Table, user_query: &str) -> Result<(String, String, usize)> {
        let instruction = match user_query.trim() {
            "" => self.settings.data_grounded_default_instruction.as_str(),
            query => query,
        };

        let cap = self.settings.max_prompt_rows;
        let total = table.row_count();

        let (csv, embedded) = if total > cap {
            warn!(
                total_rows = total,
                embedded_rows = cap,
                "Dataset exceeds prompt row cap, truncating"
            );
            (CsvParser::write_table(&table.head(cap))?, cap)
        } else {
            (CsvParser::write_table(table)?, total)
        };

        let mut prompt = format!("{}:\n", instruction);
        if embedded < total {
            prompt.push_str(&format!("(showing first {} of {} rows)\n", embedded, total));
        }
        prompt.push_str(&csv);

        Ok((
            self.settings.data_grounded_system_prompt.clone(),
            prompt,
            embedded,
        ))
    }

    fn open_domain_prompt(&self, user_query: &str) -> Result<(String, String, usize)> {
        let query = user_query.trim();
        if query.is_empty() {
            return Err(AppError::ValidationError(
                "Open-domain analysis needs a question".to_string(),
            ));
        }

        Ok((
            self.settings.open_domain_system_prompt.clone(),
            format!("{}\n\n{}", query, self.settings.open_domain_instruction),
            0,
        ))
    }
}

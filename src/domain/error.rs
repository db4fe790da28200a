use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a call to the completion service failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisFailure {
    Authentication,
    RequestTooLarge,
    RateLimited,
    Timeout,
    Connectivity,
    MalformedResponse,
    Upstream,
}

impl AnalysisFailure {
    /// Message shown to the end user; the detailed cause goes to the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisFailure::Authentication => {
                "The analysis service rejected the credentials. Check the configured API key."
            }
            AnalysisFailure::RequestTooLarge => {
                "The dataset is too large to send for analysis. Filter it down or lower the row cap."
            }
            AnalysisFailure::RateLimited => {
                "The analysis service is rate limiting requests. Try again shortly."
            }
            AnalysisFailure::Timeout => "The analysis service did not answer in time.",
            AnalysisFailure::Connectivity => "The analysis service could not be reached.",
            AnalysisFailure::MalformedResponse => {
                "The analysis service returned a response that could not be read."
            }
            AnalysisFailure::Upstream => "The analysis service reported an error.",
        }
    }
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AnalysisFailure::Authentication => "authentication",
            AnalysisFailure::RequestTooLarge => "request_too_large",
            AnalysisFailure::RateLimited => "rate_limited",
            AnalysisFailure::Timeout => "timeout",
            AnalysisFailure::Connectivity => "connectivity",
            AnalysisFailure::MalformedResponse => "malformed_response",
            AnalysisFailure::Upstream => "upstream",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    UnsupportedFormat(String),
    MalformedInput(String),
    UnknownColumn(String),
    InsufficientNumericColumns { found: usize },
    AnalysisService {
        kind: AnalysisFailure,
        message: String,
    },
    ValidationError(String),
    NotFound(String),
    ConfigError(String),
    IoError(String),
    Internal(String),
}

impl AppError {
    pub fn analysis(kind: AnalysisFailure, message: impl Into<String>) -> Self {
        AppError::AnalysisService {
            kind,
            message: message.into(),
        }
    }

    /// Stable machine-readable tag, used as the `error` field of HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat(_) => "unsupported_format",
            AppError::MalformedInput(_) => "malformed_input",
            AppError::UnknownColumn(_) => "unknown_column",
            AppError::InsufficientNumericColumns { .. } => "insufficient_numeric_columns",
            AppError::AnalysisService { .. } => "analysis_service",
            AppError::ValidationError(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::ConfigError(_) => "config_error",
            AppError::IoError(_) => "io_error",
            AppError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::UnsupportedFormat(ext) => write!(
                f,
                "Unsupported format: '{}' (expected csv or xlsx)",
                ext
            ),
            AppError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            AppError::UnknownColumn(name) => write!(f, "Unknown column: '{}'", name),
            AppError::InsufficientNumericColumns { found } => write!(
                f,
                "Heatmap requires at least two numerical columns (found {})",
                found
            ),
            AppError::AnalysisService { kind, message } => write!(
                f,
                "Analysis service error ({}): {} {}",
                kind,
                kind.user_message(),
                message
            ),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_messages_distinguish_causes() {
        let too_large = AppError::analysis(AnalysisFailure::RequestTooLarge, "413");
        let auth = AppError::analysis(AnalysisFailure::Authentication, "401");

        assert!(too_large.to_string().contains("request_too_large"));
        assert!(too_large.to_string().contains("too large"));
        assert!(auth.to_string().contains("credentials"));
        assert_ne!(
            AnalysisFailure::RequestTooLarge.user_message(),
            AnalysisFailure::Connectivity.user_message()
        );
    }

    #[test]
    fn test_heatmap_error_message() {
        let err = AppError::InsufficientNumericColumns { found: 1 };
        assert_eq!(err.code(), "insufficient_numeric_columns");
        assert!(err.to_string().contains("at least two numerical columns"));
    }
}

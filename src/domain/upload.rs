// ============================================================
// UPLOAD FORMAT & PARSE CONFIGURATION
// ============================================================

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{AppError, Result};

/// Formats accepted at the upload boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredFormat {
    Csv,
    Xlsx,
}

impl DeclaredFormat {
    /// Accepts a bare extension (`csv`, `.XLSX`) or a file name (`ports.csv`).
    pub fn from_declared(declared: &str) -> Result<Self> {
        let trimmed = declared.trim();
        let extension = match trimmed.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => trimmed,
        };

        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(DeclaredFormat::Csv),
            "xlsx" => Ok(DeclaredFormat::Xlsx),
            _ => Err(AppError::UnsupportedFormat(trimmed.to_string())),
        }
    }
}

impl fmt::Display for DeclaredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredFormat::Csv => f.write_str("csv"),
            DeclaredFormat::Xlsx => f.write_str("xlsx"),
        }
    }
}

/// Configuration for turning uploaded bytes into a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Fixed CSV delimiter; auto-detected when `None`
    pub delimiter: Option<char>,

    /// Trim whitespace around headers and values
    pub trim: bool,

    /// Literal cell contents treated as missing
    pub null_markers: Vec<String>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
            null_markers: ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "-"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ParseConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(d) = self.delimiter {
            if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
                return Err(format!("delimiter {:?} is not a usable single-byte separator", d));
            }
        }
        Ok(())
    }

    pub fn is_null_marker(&self, value: &str) -> bool {
        value.is_empty() || self.null_markers.iter().any(|m| m == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_declared() {
        assert_eq!(DeclaredFormat::from_declared("csv").unwrap(), DeclaredFormat::Csv);
        assert_eq!(DeclaredFormat::from_declared(".XLSX").unwrap(), DeclaredFormat::Xlsx);
        assert_eq!(
            DeclaredFormat::from_declared("Top Ports 2023.csv").unwrap(),
            DeclaredFormat::Csv
        );
    }

    #[test]
    fn test_rejects_other_extensions() {
        assert!(matches!(
            DeclaredFormat::from_declared("ports.txt"),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DeclaredFormat::from_declared("xls"),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(DeclaredFormat::from_declared("").is_err());
    }

    #[test]
    fn test_null_markers() {
        let config = ParseConfig::default();
        assert!(config.is_null_marker(""));
        assert!(config.is_null_marker("N/A"));
        assert!(!config.is_null_marker("Nanjing"));
    }
}

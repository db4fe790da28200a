// ============================================================
// CSV PARSER
// ============================================================
// Parse uploaded CSV bytes with encoding and delimiter detection

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use encoding_rs::{UTF_8, WINDOWS_1252};
use tracing::debug;

use super::column_typer::RawTable;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{CellValue, Table};
use crate::domain::upload::ParseConfig;

/// CSV parser with encoding detection
pub struct CsvParser {
    /// Delimiter character; detected from the content when `None`
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ParseConfig) -> Self {
        let parser = Self {
            trim: config.trim,
            ..Self::new()
        };
        match config.delimiter {
            Some(c) => parser.with_delimiter(c as u8),
            None => parser,
        }
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Parse raw upload bytes into header + rows of text cells
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<RawTable> {
        let content = Self::decode(bytes)?;
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<RawTable> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = reader.records();
        // Byte offset where the most recent record starts
        let mut last_start = 0usize;

        let headers: Vec<String> = match records.next() {
            Some(result) => {
                let record = result.map_err(|e| {
                    AppError::MalformedInput(format!("Failed to read CSV headers: {}", e))
                })?;
                last_start = record_start(&record, last_start);
                record.iter().map(|s| s.to_string()).collect()
            }
            None => {
                return Err(AppError::MalformedInput(
                    "CSV has no header row".to_string(),
                ))
            }
        };

        let mut rows = Vec::new();
        for (index, result) in records.enumerate() {
            let record = result.map_err(|e| {
                AppError::MalformedInput(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            last_start = record_start(&record, last_start);

            if record.len() > headers.len() {
                return Err(AppError::MalformedInput(format!(
                    "CSV row {} has {} fields, header has {}",
                    index + 1,
                    record.len(),
                    headers.len()
                )));
            }

            rows.push(
                record
                    .iter()
                    .map(|s| CellValue::Text(s.to_string()))
                    .collect(),
            );
        }

        // An unclosed quote swallows the rest of the input into the final record
        if ends_inside_quotes(&content.as_bytes()[last_start..], delimiter) {
            return Err(AppError::MalformedInput(
                "CSV has an unterminated quoted field".to_string(),
            ));
        }

        debug!(
            delimiter = %(delimiter as char),
            columns = headers.len(),
            rows = rows.len(),
            "Parsed CSV content"
        );

        Ok(RawTable { headers, rows })
    }

    /// Decode bytes as UTF-8 (BOM aware), falling back to Windows-1252
    fn decode(bytes: &[u8]) -> Result<String> {
        let (text, _, had_errors) = UTF_8.decode(bytes);
        let text = if had_errors {
            debug!("Upload is not valid UTF-8, decoding as Windows-1252");
            WINDOWS_1252.decode(bytes).0.into_owned()
        } else {
            text.into_owned()
        };

        // NUL bytes never appear in a text table; this is a binary file with a .csv name
        if text.contains('\0') {
            return Err(AppError::MalformedInput(
                "CSV upload contains binary data".to_string(),
            ));
        }

        Ok(text)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        let sample_lines: Vec<_> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(10)
            .collect();

        let Some(header) = sample_lines.first() else {
            return best_delimiter;
        };

        // A delimiter that never separates the header cannot split the rows either
        for delimiter in candidates
            .into_iter()
            .filter(|&d| header.bytes().any(|b| b == d))
        {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }

    /// Render a table as comma-separated text with a header row
    pub fn write_table(table: &Table) -> Result<String> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());

        writer
            .write_record(table.column_names())
            .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

        for row in table.rows() {
            let record: Vec<String> = row.cells().map(|c| c.to_text().into_owned()).collect();
            writer
                .write_record(&record)
                .map_err(|e| AppError::Internal(format!("Failed to write CSV row: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;

        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
    }
}

fn record_start(record: &StringRecord, fallback: usize) -> usize {
    record
        .position()
        .map(|p| p.byte() as usize)
        .unwrap_or(fallback)
}

/// Whether `raw` (one or more CSV records) ends inside a quoted field.
/// Quotes only open a field when they are its first byte, as the csv reader does.
fn ends_inside_quotes(raw: &[u8], delimiter: u8) -> bool {
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut i = 0;

    while i < raw.len() {
        let b = raw[i];
        if in_quotes {
            if b == b'"' {
                if raw.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if at_field_start && b == b'"' {
            in_quotes = true;
            at_field_start = false;
        } else {
            at_field_start = b == delimiter || b == b'\n' || b == b'\r';
        }
        i += 1;
    }

    in_quotes
}

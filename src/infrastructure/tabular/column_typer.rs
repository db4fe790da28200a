// ============================================================
// COLUMN TYPER
// ============================================================
// Normalize headers and infer a type for every column

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::domain::error::{AppError, Result};
use crate::domain::table::{CellValue, Column, ColumnType, Table};
use crate::domain::upload::ParseConfig;

static THOUSANDS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

/// Header row plus data rows, as read from the upload before typing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Turns a `RawTable` into a typed `Table`
pub struct ColumnTyper<'a> {
    config: &'a ParseConfig,
}

impl<'a> ColumnTyper<'a> {
    pub fn new(config: &'a ParseConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, raw: RawTable) -> Result<Table> {
        if raw.headers.is_empty() {
            return Err(AppError::MalformedInput(
                "A header row is required".to_string(),
            ));
        }

        let headers = Self::normalize_headers(&raw.headers, self.config.trim);
        let width = headers.len();

        if let Some((idx, row)) = raw.rows.iter().enumerate().find(|(_, r)| r.len() > width) {
            return Err(AppError::MalformedInput(format!(
                "Row {} has {} fields, header has {}",
                idx + 1,
                row.len(),
                width
            )));
        }

        let mut cells_by_column: Vec<Vec<CellValue>> =
            vec![Vec::with_capacity(raw.rows.len()); width];
        for row in raw.rows {
            let mut row = row.into_iter();
            for column in cells_by_column.iter_mut() {
                let cell = row.next().unwrap_or(CellValue::Null);
                column.push(self.clean_cell(cell));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells_by_column)
            .map(|(name, values)| Self::type_column(name, values))
            .collect();

        Table::new(columns)
    }

    /// Blank headers become `Unnamed: {index}`; repeats get `.1`, `.2`, ...
    fn normalize_headers(headers: &[String], trim: bool) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(headers.len());

        for (idx, header) in headers.iter().enumerate() {
            let base = if trim { header.trim() } else { header.as_str() };
            let base = if base.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                base.to_string()
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while seen.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }

            seen.insert(name.clone());
            out.push(name);
        }

        out
    }

    fn clean_cell(&self, cell: CellValue) -> CellValue {
        match cell {
            CellValue::Text(s) => {
                let value = if self.config.trim { s.trim() } else { s.as_str() };
                if self.config.is_null_marker(value) {
                    CellValue::Null
                } else if value.len() == s.len() {
                    CellValue::Text(s)
                } else {
                    CellValue::Text(value.to_string())
                }
            }
            CellValue::Number(n) if !n.is_finite() => CellValue::Null,
            other => other,
        }
    }

    /// Numeric when every non-null cell is a number and at least one exists
    fn type_column(name: String, values: Vec<CellValue>) -> Column {
        let parsed: Option<Vec<CellValue>> = values
            .iter()
            .map(|cell| match cell {
                CellValue::Null => Some(CellValue::Null),
                CellValue::Number(n) => Some(CellValue::Number(*n)),
                CellValue::Text(s) => parse_number(s).map(CellValue::Number),
            })
            .collect();

        let has_values = values.iter().any(|c| !c.is_null());

        match parsed {
            Some(numbers) if has_values => Column::new(name, ColumnType::Numeric, numbers),
            _ => {
                let texts = values
                    .into_iter()
                    .map(|cell| match cell {
                        CellValue::Number(n) => CellValue::Text(n.to_string()),
                        other => other,
                    })
                    .collect();
                Column::new(name, ColumnType::Text, texts)
            }
        }
    }
}

/// Parse a finite number, accepting thousands separators like `1,234.5`
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if THOUSANDS_PATTERN.is_match(trimmed) {
        trimmed.replace(',', "")
    } else {
        trimmed.to_string()
    };

    candidate.parse::<f64>().ok().filter(|n| n.is_finite())
}

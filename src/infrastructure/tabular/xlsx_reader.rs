// ============================================================
// XLSX READER
// ============================================================
// Read the first worksheet of an uploaded workbook

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use tracing::debug;

use super::column_typer::RawTable;
use crate::domain::error::{AppError, Result};
use crate::domain::table::CellValue;

pub struct XlsxReader;

impl XlsxReader {
    pub fn read_bytes(bytes: &[u8]) -> Result<RawTable> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| {
            AppError::MalformedInput(format!("Failed to open Excel workbook: {}", e))
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::MalformedInput("No worksheet found".to_string()))?
            .map_err(|e| AppError::MalformedInput(format!("Failed to read Excel range: {}", e)))?;

        let raw = Self::range_to_raw(&range)?;

        debug!(
            columns = raw.headers.len(),
            rows = raw.rows.len(),
            "Read first worksheet"
        );

        Ok(raw)
    }

    /// First row is the header; numeric cells stay numeric
    pub fn range_to_raw(range: &Range<Data>) -> Result<RawTable> {
        let mut rows = range.rows();

        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| AppError::MalformedInput("Worksheet is empty".to_string()))?
            .iter()
            .map(|cell| match cell {
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect();

        let rows = rows
            .map(|row| row.iter().map(Self::cell_value).collect())
            .collect();

        Ok(RawTable { headers, rows })
    }

    fn cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Null,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

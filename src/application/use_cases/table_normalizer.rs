// ============================================================
// TABLE NORMALIZER USE CASE
// ============================================================
// Uploaded bytes + declared extension -> typed Table

use std::time::Instant;

use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;
use crate::domain::upload::{DeclaredFormat, ParseConfig};
use crate::infrastructure::tabular::{ColumnTyper, CsvParser, RawTable, XlsxReader};

pub struct TableNormalizer {
    config: ParseConfig,
}

impl TableNormalizer {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    /// Parse an upload. The extension is checked before any byte is read,
    /// and a parse failure never yields a partial table.
    pub fn parse(&self, bytes: &[u8], declared_extension: &str) -> Result<Table> {
        let format = DeclaredFormat::from_declared(declared_extension).map_err(|e| {
            warn!(declared = %declared_extension, "Rejected upload with unsupported format");
            e
        })?;

        self.config.validate().map_err(|e| {
            AppError::ConfigError(format!("Invalid parse config: {}", e))
        })?;

        let start = Instant::now();

        let raw: RawTable = match format {
            DeclaredFormat::Csv => CsvParser::from_config(&self.config).parse_bytes(bytes)?,
            DeclaredFormat::Xlsx => XlsxReader::read_bytes(bytes)?,
        };

        let table = ColumnTyper::new(&self.config).build(raw)?;

        info!(
            format = %format,
            bytes = bytes.len(),
            rows = table.row_count(),
            columns = table.column_count(),
            numeric_columns = table.numeric_columns().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upload normalized"
        );

        Ok(table)
    }
}

impl Default for TableNormalizer {
    fn default() -> Self {
        Self::new(ParseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{CellValue, ColumnType};

    #[test]
    fn test_parse_csv_upload() {
        let csv = b"Port Name,Country,MillionTEU2023\nShanghai,China,49.2\nSingapore,Singapore,39.0\n";
        let table = TableNormalizer::default().parse(csv, "ports.csv").unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["Port Name", "Country", "MillionTEU2023"]);
        assert_eq!(table.column("MillionTEU2023").unwrap().kind, ColumnType::Numeric);
        assert_eq!(table.column("Country").unwrap().kind, ColumnType::Text);
        assert_eq!(
            table.column("MillionTEU2023").unwrap().values[1],
            CellValue::Number(39.0)
        );
    }

    #[test]
    fn test_txt_is_rejected_before_parsing() {
        // Bytes that would otherwise parse fine as CSV
        let err = TableNormalizer::default()
            .parse(b"Port Name\nShanghai", "ports.txt")
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_xlsx_is_malformed() {
        let err = TableNormalizer::default()
            .parse(b"Port Name,Country\nShanghai,China", "xlsx")
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }

    #[test]
    fn test_unclosed_quote_is_malformed() {
        let err = TableNormalizer::default()
            .parse(b"Port Name,Country\n\"Shanghai,China\nBusan,South Korea\n", "csv")
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }

    #[test]
    fn test_single_column_with_semicolons_in_values() {
        let table = TableNormalizer::default()
            .parse(b"Port Name\nShanghai; Yangshan\nBusan; New Port\n", "csv")
            .unwrap();
        assert_eq!(table.column_names(), vec!["Port Name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("Port Name").unwrap().values[0],
            CellValue::from("Shanghai; Yangshan")
        );
    }

    #[test]
    fn test_header_only_csv_is_empty_table() {
        let table = TableNormalizer::default()
            .parse(b"Port Name,Country\n", "csv")
            .unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_semicolon_export() {
        let csv = "Port Name;Country;MillionTEU2023\nRotterdam;Netherlands;13,447.0\n";
        let table = TableNormalizer::default().parse(csv.as_bytes(), "csv").unwrap();
        assert_eq!(
            table.column("MillionTEU2023").unwrap().values[0],
            CellValue::Number(13447.0)
        );
    }
}

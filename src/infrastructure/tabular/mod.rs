// ============================================================
// TABULAR INFRASTRUCTURE LAYER
// ============================================================
// CSV/XLSX decoding, header normalization and column typing

mod column_typer;
mod csv_parser;
mod xlsx_reader;

pub use column_typer::{ColumnTyper, RawTable};
pub use csv_parser::CsvParser;
pub use xlsx_reader::XlsxReader;

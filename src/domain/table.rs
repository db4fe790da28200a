// ============================================================
// TABLE TYPES
// ============================================================
// Canonical column-oriented table produced by the upload parsers
// No I/O, no async, no external dependencies beyond serde

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use super::error::{AppError, Result};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text form used by search and prompt rendering. Nulls render as empty text.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            CellValue::Number(n) => Cow::Owned(n.to_string()),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ColumnType,

    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(
            name,
            ColumnType::Numeric,
            values.into_iter().map(CellValue::from).collect(),
        )
    }

    #[cfg(test)]
    pub fn text(name: impl Into<String>, values: Vec<Option<&str>>) -> Self {
        Self::new(
            name,
            ColumnType::Text,
            values.into_iter().map(CellValue::from).collect(),
        )
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnType::Numeric
    }

    /// Non-null numeric values in row order
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(CellValue::as_f64).collect()
    }
}

/// Column-oriented table. Every column has `row_count` values and names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);

        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != row_count {
                return Err(AppError::ValidationError(format!(
                    "Column '{}' has {} values, expected {}",
                    column.name,
                    column.len(),
                    row_count
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Append a column computed per row index, or replace the existing column
    /// with the same name in place. The new column always has `row_count` values.
    pub fn derive_column<F>(mut self, name: &str, kind: ColumnType, f: F) -> Table
    where
        F: FnMut(usize) -> CellValue,
    {
        let column = Column::new(name, kind, (0..self.row_count).map(f).collect());

        match self.columns.iter().position(|c| c.name == name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }

        self
    }

    /// Build a new table holding only the given rows, in the given order.
    /// Indices past the end are ignored.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let indices: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.row_count)
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                kind: column.kind,
                values: indices.iter().map(|&i| column.values[i].clone()).collect(),
            })
            .collect();

        Table {
            columns,
            row_count: indices.len(),
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..self.row_count.min(n)).collect();
        self.select_rows(&indices)
    }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.row_count).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.row_count).map(move |index| Row { table: self, index })
    }
}

/// Positional view of one row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.table
            .column(column)
            .and_then(|c| c.values.get(self.index))
    }

    pub fn cells(&self) -> impl Iterator<Item = &'a CellValue> + 'a {
        let index = self.index;
        self.table
            .columns
            .iter()
            .filter_map(move |c| c.values.get(index))
    }

    /// All cells stringified and joined with a single space
    pub fn joined_text(&self) -> String {
        self.cells()
            .map(|cell| cell.to_text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::text("Port Name", vec![Some("Shanghai"), Some("Busan"), None]),
            Column::numeric("MillionTEU2023", vec![Some(49.2), None, Some(7.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::text("a", vec![Some("x")]),
            Column::numeric("b", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::text("a", vec![Some("x")]),
            Column::text("a", vec![Some("y")]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_rows_builds_new_table() {
        let table = sample();
        let view = table.select_rows(&[2, 0, 9]);

        assert_eq!(view.row_count(), 2);
        assert_eq!(view.column_names(), vec!["Port Name", "MillionTEU2023"]);
        assert_eq!(view.row(1).unwrap().get("Port Name"), Some(&CellValue::from("Shanghai")));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_joined_text_renders_nulls_empty() {
        let table = sample();
        assert_eq!(table.row(0).unwrap().joined_text(), "Shanghai 49.2");
        assert_eq!(table.row(1).unwrap().joined_text(), "Busan ");
        assert_eq!(table.row(2).unwrap().joined_text(), " 7");
    }

    #[test]
    fn test_derive_column_replaces_in_place() {
        let table = sample().derive_column("Port Name", ColumnType::Numeric, |i| {
            CellValue::Number(i as f64)
        });

        assert_eq!(table.column_names(), vec!["Port Name", "MillionTEU2023"]);
        assert!(table.column("Port Name").unwrap().is_numeric());
        assert_eq!(table.column("Port Name").unwrap().values[2], CellValue::Number(2.0));
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            CellValue::Null,
            CellValue::Number(1.5),
            CellValue::from("x"),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1.5,"x"]"#);
    }
}

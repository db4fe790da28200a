use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::AppError;
use super::table::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[serde(alias = "Line Chart")]
    Line,
    #[serde(alias = "Bar Chart")]
    Bar,
    #[serde(alias = "Scatter Plot")]
    Scatter,
    #[serde(alias = "Histogram")]
    Histogram,
    #[serde(alias = "Box Plot")]
    Box,
    #[serde(alias = "Heatmap")]
    Heatmap,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
            ChartType::Box => "box",
            ChartType::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "line" | "line chart" => Ok(ChartType::Line),
            "bar" | "bar chart" => Ok(ChartType::Bar),
            "scatter" | "scatter plot" => Ok(ChartType::Scatter),
            "histogram" => Ok(ChartType::Histogram),
            "box" | "box plot" => Ok(ChartType::Box),
            "heatmap" => Ok(ChartType::Heatmap),
            _ => Err(AppError::ValidationError(format!(
                "Unknown chart type '{}'",
                s
            ))),
        }
    }
}

/// Data handed to the renderer. No aggregation is done here beyond
/// dropping unpaired rows and computing the heatmap correlations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartPayload {
    Pairs {
        x: Vec<CellValue>,
        y: Vec<CellValue>,
        dropped_rows: usize,
    },
    Histogram {
        values: Vec<f64>,
        bins: usize,
        dropped_rows: usize,
    },
    Correlation {
        columns: Vec<String>,
        /// `matrix[i][j]` is the Pearson coefficient of `columns[i]` and `columns[j]`;
        /// `None` where it is undefined (constant column or fewer than two pairs).
        matrix: Vec<Vec<Option<f64>>>,
    },
}

impl ChartPayload {
    /// Whether a renderer has anything to draw
    pub fn is_drawable(&self) -> bool {
        match self {
            ChartPayload::Pairs { x, .. } => !x.is_empty(),
            ChartPayload::Histogram { values, .. } => !values.is_empty(),
            ChartPayload::Correlation { matrix, .. } => {
                matrix.iter().flatten().any(Option::is_some)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub title: String,
    pub x_field: Option<String>,
    pub y_field: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub payload: ChartPayload,
    /// False when the payload has nothing to draw, e.g. a heatmap whose
    /// coefficients are all undefined.
    pub valid: bool,
}

/// Axis/type choice made before resolution, with anything worth telling the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSelection {
    pub chart_type: ChartType,
    pub x_field: Option<String>,
    pub y_field: Option<String>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Bin count the renderer should use for histograms
    pub histogram_bins: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { histogram_bins: 20 }
    }
}

impl ChartConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.histogram_bins == 0 {
            return Err("histogram_bins must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_and_labels() {
        assert_eq!("bar".parse::<ChartType>().unwrap(), ChartType::Bar);
        assert_eq!("Box Plot".parse::<ChartType>().unwrap(), ChartType::Box);
        assert_eq!(" Heatmap ".parse::<ChartType>().unwrap(), ChartType::Heatmap);
        assert!("pie".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_deserialize_ui_label() {
        let chart: ChartType = serde_json::from_str("\"Scatter Plot\"").unwrap();
        assert_eq!(chart, ChartType::Scatter);
        let chart: ChartType = serde_json::from_str("\"line\"").unwrap();
        assert_eq!(chart, ChartType::Line);
    }
}

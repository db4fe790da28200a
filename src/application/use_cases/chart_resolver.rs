// ============================================================
// CHART RESOLVER USE CASE
// ============================================================
// Validates an axis/type selection against a table and packages
// the data a renderer needs. Nothing is drawn here.

use tracing::{debug, warn};

use crate::domain::chart::{ChartConfig, ChartPayload, ChartSelection, ChartSpec, ChartType};
use crate::domain::columns::{MILLION_TEU, PORT_NAME};
use crate::domain::error::{AppError, Result};
use crate::domain::table::{CellValue, Column, Table};

pub struct ChartResolver {
    config: ChartConfig,
}

impl ChartResolver {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    pub fn resolve(
        &self,
        table: &Table,
        x_field: Option<&str>,
        y_field: Option<&str>,
        chart_type: ChartType,
    ) -> Result<ChartSpec> {
        // Histograms plot one column: y, or x when only x is given
        let (x_field, y_field) = match chart_type {
            ChartType::Histogram => (None, y_field.or(x_field)),
            _ => (x_field, y_field),
        };

        let x = x_field.map(|name| require_column(table, name)).transpose()?;
        let y = y_field.map(|name| require_column(table, name)).transpose()?;

        let spec = match chart_type {
            ChartType::Heatmap => self.heatmap(table)?,
            ChartType::Histogram => {
                let y = y.ok_or_else(|| {
                    AppError::ValidationError("Histogram requires a field".to_string())
                })?;
                self.histogram(y)?
            }
            paired => {
                let (x, y) = x.zip(y).ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "{} chart requires both an x and a y field",
                        paired
                    ))
                })?;
                pairs(paired, x, y)?
            }
        };

        debug!(
            chart_type = %spec.chart_type,
            title = %spec.title,
            "Chart resolved"
        );

        Ok(spec)
    }

    /// Bar chart of `MillionTEU2023` by `Port Name`, degrading to whatever the
    /// table has when those columns are missing.
    pub fn default_selection(table: &Table) -> ChartSelection {
        let mut notices = Vec::new();

        let x_field = if table.has_column(PORT_NAME) {
            Some(PORT_NAME.to_string())
        } else {
            let fallback = table
                .columns()
                .iter()
                .find(|c| !c.is_numeric())
                .or_else(|| table.columns().first())
                .map(|c| c.name.clone());
            notices.push(match &fallback {
                Some(name) => format!("'{}' column not found, using '{}' for x", PORT_NAME, name),
                None => format!("'{}' column not found", PORT_NAME),
            });
            fallback
        };

        let y_field = if table.column(MILLION_TEU).is_some_and(Column::is_numeric) {
            Some(MILLION_TEU.to_string())
        } else {
            let fallback = table.numeric_columns().next().map(|c| c.name.clone());
            notices.push(match &fallback {
                Some(name) => format!(
                    "'{}' column not found, showing '{}' instead",
                    MILLION_TEU, name
                ),
                None => format!(
                    "'{}' column not found and the table has no numeric columns",
                    MILLION_TEU
                ),
            });
            fallback
        };

        if !notices.is_empty() {
            warn!(notices = ?notices, "Default chart selection degraded");
        }

        ChartSelection {
            chart_type: ChartType::Bar,
            x_field,
            y_field,
            notices,
        }
    }

    fn histogram(&self, y: &Column) -> Result<ChartSpec> {
        if !y.is_numeric() {
            return Err(AppError::ValidationError(format!(
                "Histogram needs a numeric column, '{}' is text",
                y.name
            )));
        }

        let values = y.numbers();
        if values.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Column '{}' has no values to plot",
                y.name
            )));
        }

        let payload = ChartPayload::Histogram {
            dropped_rows: y.len() - values.len(),
            values,
            bins: self.config.histogram_bins,
        };

        Ok(ChartSpec {
            chart_type: ChartType::Histogram,
            title: format!("Histogram of {}", y.name),
            x_field: None,
            y_field: Some(y.name.clone()),
            x_label: Some(y.name.clone()),
            y_label: Some("Count".to_string()),
            valid: payload.is_drawable(),
            payload,
        })
    }

    fn heatmap(&self, table: &Table) -> Result<ChartSpec> {
        let numeric: Vec<&Column> = table.numeric_columns().collect();
        if numeric.len() < 2 {
            return Err(AppError::InsufficientNumericColumns {
                found: numeric.len(),
            });
        }

        let matrix = numeric
            .iter()
            .map(|a| numeric.iter().map(|b| pearson(a, b)).collect())
            .collect();

        let payload = ChartPayload::Correlation {
            columns: numeric.iter().map(|c| c.name.clone()).collect(),
            matrix,
        };
        if !payload.is_drawable() {
            warn!(columns = numeric.len(), "No defined correlations to draw");
        }

        Ok(ChartSpec {
            chart_type: ChartType::Heatmap,
            title: "Correlation Heatmap".to_string(),
            x_field: None,
            y_field: None,
            x_label: None,
            y_label: None,
            valid: payload.is_drawable(),
            payload,
        })
    }
}

impl Default for ChartResolver {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

fn require_column<'t>(table: &'t Table, name: &str) -> Result<&'t Column> {
    table
        .column(name)
        .ok_or_else(|| AppError::UnknownColumn(name.to_string()))
}

fn pairs(chart_type: ChartType, x: &Column, y: &Column) -> Result<ChartSpec> {
    let (xs, ys): (Vec<CellValue>, Vec<CellValue>) = x
        .values
        .iter()
        .zip(&y.values)
        .filter(|(a, b)| !a.is_null() && !b.is_null())
        .map(|(a, b)| (a.clone(), b.clone()))
        .unzip();

    if xs.is_empty() {
        return Err(AppError::ValidationError(format!(
            "No rows with both '{}' and '{}' set",
            x.name, y.name
        )));
    }

    let title = match chart_type {
        ChartType::Box => format!("Box Plot of {} by {}", y.name, x.name),
        _ => format!("{} vs {}", y.name, x.name),
    };

    let payload = ChartPayload::Pairs {
        dropped_rows: x.len() - xs.len(),
        x: xs,
        y: ys,
    };

    Ok(ChartSpec {
        chart_type,
        title,
        x_field: Some(x.name.clone()),
        y_field: Some(y.name.clone()),
        x_label: Some(x.name.clone()),
        y_label: Some(y.name.clone()),
        valid: payload.is_drawable(),
        payload,
    })
}

/// Pearson coefficient over rows where both columns are set.
/// `None` with fewer than two such rows or when either side is constant.
fn pearson(a: &Column, b: &Column) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .values
        .iter()
        .zip(&b.values)
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

use crate::domain::summary::{ColumnSummary, DatasetSummary};
use crate::domain::table::{Column, Table};

/// First `n` rows of the table
pub fn preview(table: &Table, n: usize) -> Table {
    table.head(n)
}

/// Per numeric column: count, mean, sample std, min, quartiles, max.
pub fn describe(table: &Table) -> DatasetSummary {
    DatasetSummary {
        row_count: table.row_count(),
        column_count: table.column_count(),
        numeric: table.numeric_columns().map(summarize).collect(),
    }
}

fn summarize(column: &Column) -> ColumnSummary {
    let mut values = column.numbers();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    ColumnSummary {
        column: column.name.clone(),
        count,
        mean,
        std,
        min: values.first().copied(),
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.5),
        p75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Linear interpolation between closest ranks; `sorted` must be ascending
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

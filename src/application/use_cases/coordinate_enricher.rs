use tracing::{debug, info};

use crate::domain::columns::{LATITUDE, LONGITUDE, PORT_NAME};
use crate::domain::gazetteer::{self, Coordinates};
use crate::domain::table::{CellValue, ColumnType, Table};

/// Backfill `latitude`/`longitude` from the gazetteer.
///
/// Tables without a `Port Name` column, or that already carry both coordinate
/// columns, are returned unchanged. Existing coordinates are never corrected.
/// Ports missing from the gazetteer get null in both columns.
pub fn enrich(table: Table) -> Table {
    let Some(port_names) = table.column(PORT_NAME) else {
        debug!("No '{}' column, skipping coordinate enrichment", PORT_NAME);
        return table;
    };

    if table.has_column(LATITUDE) && table.has_column(LONGITUDE) {
        debug!("Coordinates already present, skipping enrichment");
        return table;
    }

    let lookups: Vec<Option<Coordinates>> = port_names
        .values
        .iter()
        .map(|cell| match cell {
            CellValue::Text(name) => gazetteer::lookup(name),
            _ => None,
        })
        .collect();

    let resolved = lookups.iter().filter(|c| c.is_some()).count();

    info!(
        rows = lookups.len(),
        resolved,
        unresolved = lookups.len() - resolved,
        "Backfilled port coordinates"
    );

    // Both columns come from the same lookup, so a lone pre-existing one is replaced
    table
        .derive_column(LATITUDE, ColumnType::Numeric, |i| {
            CellValue::from(lookups[i].map(|c| c.latitude))
        })
        .derive_column(LONGITUDE, ColumnType::Numeric, |i| {
            CellValue::from(lookups[i].map(|c| c.longitude))
        })
}

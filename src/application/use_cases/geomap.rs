use tracing::debug;

use crate::domain::columns::{COUNTRY, LATITUDE, LONGITUDE, MILLION_TEU, PORT_NAME};
use crate::domain::gazetteer::Coordinates;
use crate::domain::geo::{MapConfig, MapMarker, MapView};
use crate::domain::table::{CellValue, Table};

pub struct GeomapBuilder {
    config: MapConfig,
}

impl GeomapBuilder {
    pub fn new(config: MapConfig) -> Self {
        Self { config }
    }

    /// Markers for every row with both coordinates set. Rows without them are
    /// counted and left off the map.
    pub fn build_map(&self, table: &Table) -> MapView {
        let (Some(latitudes), Some(longitudes)) = (table.column(LATITUDE), table.column(LONGITUDE))
        else {
            return MapView {
                center: None,
                zoom: self.config.zoom_start,
                markers: Vec::new(),
                skipped_rows: 0,
                notices: vec![format!(
                    "No '{}' and '{}' columns found in the dataset for geomap visualisation.",
                    LATITUDE, LONGITUDE
                )],
            };
        };

        let mut notices = Vec::new();
        for name in [PORT_NAME, COUNTRY, MILLION_TEU] {
            if !table.has_column(name) {
                notices.push(format!("'{}' column not found, omitted from popups", name));
            }
        }

        let mut markers = Vec::new();
        let mut skipped_rows = 0;

        for row in table.rows() {
            let i = row.index();
            let coords = latitudes.values[i]
                .as_f64()
                .zip(longitudes.values[i].as_f64())
                .filter(|(lat, lon)| lat.is_finite() && lon.is_finite());

            let Some((latitude, longitude)) = coords else {
                skipped_rows += 1;
                continue;
            };

            markers.push(MapMarker {
                row: i,
                latitude,
                longitude,
                port_name: row.get(PORT_NAME).and_then(text_of),
                country: row.get(COUNTRY).and_then(text_of),
                million_teu: row.get(MILLION_TEU).and_then(CellValue::as_f64),
            });
        }

        let center = (!markers.is_empty()).then(|| {
            let n = markers.len() as f64;
            Coordinates {
                latitude: markers.iter().map(|m| m.latitude).sum::<f64>() / n,
                longitude: markers.iter().map(|m| m.longitude).sum::<f64>() / n,
            }
        });

        debug!(
            markers = markers.len(),
            skipped_rows,
            "Map built"
        );

        MapView {
            center,
            zoom: self.config.zoom_start,
            markers,
            skipped_rows,
            notices,
        }
    }
}

impl Default for GeomapBuilder {
    fn default() -> Self {
        Self::new(MapConfig::default())
    }
}

fn text_of(cell: &CellValue) -> Option<String> {
    (!cell.is_null()).then(|| cell.to_text().into_owned())
}

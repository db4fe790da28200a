use serde::{Deserialize, Serialize};

use super::gazetteer::Coordinates;

/// One plottable port. Popup fields are absent when the column is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub row: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub port_name: Option<String>,
    pub country: Option<String>,
    pub million_teu: Option<f64>,
}

impl MapMarker {
    /// Plain-text popup, e.g. `Port: Shanghai | Country: China | TEUs: 49.2M`
    pub fn popup_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(port) = &self.port_name {
            parts.push(format!("Port: {}", port));
        }
        if let Some(country) = &self.country {
            parts.push(format!("Country: {}", country));
        }
        if let Some(teu) = self.million_teu {
            parts.push(format!("TEUs: {}M", teu));
        }
        parts.join(" | ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Option<Coordinates>,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
    /// Rows left off the map because a coordinate was missing
    pub skipped_rows: usize,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub zoom_start: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { zoom_start: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_text_skips_missing_fields() {
        let marker = MapMarker {
            row: 0,
            latitude: 1.0,
            longitude: 2.0,
            port_name: Some("Shanghai".to_string()),
            country: None,
            million_teu: Some(49.2),
        };
        assert_eq!(marker.popup_text(), "Port: Shanghai | TEUs: 49.2M");
    }
}

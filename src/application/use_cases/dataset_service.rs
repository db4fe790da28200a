// ============================================================
// DATASET SERVICE
// ============================================================
// Upload pipeline (normalize -> enrich) plus the in-memory registry
// of enriched datasets. Nothing is persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::coordinate_enricher::enrich;
use super::table_normalizer::TableNormalizer;
use crate::domain::error::{AppError, Result};
use crate::domain::table::Table;

/// An uploaded, enriched table. Never mutated after ingest.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub table: Table,
}

pub struct DatasetService {
    normalizer: TableNormalizer,
    datasets: Mutex<HashMap<Uuid, Arc<Dataset>>>,
}

impl DatasetService {
    pub fn new(normalizer: TableNormalizer) -> Self {
        Self {
            normalizer,
            datasets: Mutex::new(HashMap::new()),
        }
    }

    /// Parse, enrich and register an upload. Nothing is stored when parsing fails.
    pub fn ingest(&self, bytes: &[u8], file_name: &str) -> Result<Arc<Dataset>> {
        let table = enrich(self.normalizer.parse(bytes, file_name)?);

        let dataset = Arc::new(Dataset {
            id: Uuid::new_v4(),
            name: file_name.to_string(),
            created_at: Utc::now(),
            table,
        });

        self.lock()?.insert(dataset.id, dataset.clone());

        info!(
            dataset_id = %dataset.id,
            name = %dataset.name,
            rows = dataset.table.row_count(),
            "Dataset registered"
        );

        Ok(dataset)
    }

    pub fn get(&self, id: &Uuid) -> Result<Arc<Dataset>> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Dataset {}", id)))
    }

    pub fn remove(&self, id: &Uuid) -> Result<()> {
        match self.lock()?.remove(id) {
            Some(_) => {
                info!(dataset_id = %id, "Dataset removed");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Dataset {}", id))),
        }
    }

    /// Registered datasets, oldest first
    pub fn list(&self) -> Result<Vec<Arc<Dataset>>> {
        let mut datasets: Vec<Arc<Dataset>> = self.lock()?.values().cloned().collect();
        datasets.sort_by_key(|d| d.created_at);
        Ok(datasets)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Arc<Dataset>>>> {
        self.datasets
            .lock()
            .map_err(|_| AppError::Internal("Dataset registry lock poisoned".to_string()))
    }
}

impl Default for DatasetService {
    fn default() -> Self {
        Self::new(TableNormalizer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::columns::{LATITUDE, LONGITUDE};
    use crate::domain::table::CellValue;

    const PORTS_CSV: &[u8] = b"Port Name,Country,MillionTEU2023\nShanghai,China,49.2\nAtlantis,Nowhere,1.0\n";

    #[test]
    fn test_ingest_normalizes_and_enriches() {
        let service = DatasetService::default();
        let dataset = service.ingest(PORTS_CSV, "ports.csv").unwrap();

        assert_eq!(dataset.name, "ports.csv");
        assert_eq!(dataset.table.row_count(), 2);
        assert_eq!(
            dataset.table.column(LATITUDE).unwrap().values[0],
            CellValue::Number(31.2304)
        );
        assert!(dataset.table.column(LONGITUDE).unwrap().values[1].is_null());
        assert_eq!(service.get(&dataset.id).unwrap().id, dataset.id);
    }

    #[test]
    fn test_failed_ingest_stores_nothing() {
        let service = DatasetService::default();
        assert!(service.ingest(PORTS_CSV, "ports.txt").is_err());
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_remove_and_not_found() {
        let service = DatasetService::default();
        let dataset = service.ingest(PORTS_CSV, "csv").unwrap();

        service.remove(&dataset.id).unwrap();
        assert!(matches!(service.get(&dataset.id), Err(AppError::NotFound(_))));
        assert!(matches!(service.remove(&dataset.id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_list_returns_all() {
        let service = DatasetService::default();
        let a = service.ingest(PORTS_CSV, "a.csv").unwrap();
        let b = service.ingest(PORTS_CSV, "b.csv").unwrap();

        let ids: Vec<Uuid> = service.list().unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }
}

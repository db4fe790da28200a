pub mod analysis_orchestrator;
pub mod chart_resolver;
pub mod coordinate_enricher;
pub mod dataset_service;
pub mod dataset_summary;
pub mod geomap;
pub mod query_engine;
pub mod table_normalizer;

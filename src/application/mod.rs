pub mod use_cases;

pub use use_cases::analysis_orchestrator::AnalysisOrchestrator;
pub use use_cases::chart_resolver::ChartResolver;
pub use use_cases::dataset_service::{Dataset, DatasetService};
pub use use_cases::geomap::GeomapBuilder;
pub use use_cases::table_normalizer::TableNormalizer;

pub mod analysis;
pub mod chart;
pub mod columns;
pub mod error;
pub mod gazetteer;
pub mod geo;
pub mod llm_config;
pub mod summary;
pub mod table;
pub mod upload;

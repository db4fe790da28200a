use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::application::{
    AnalysisOrchestrator, ChartResolver, DatasetService, GeomapBuilder, TableNormalizer,
};
use crate::domain::error::Result;
use crate::infrastructure::config::{AppConfig, ConfigService};
use crate::infrastructure::llm_clients::RouterClient;
use crate::interfaces::http::{self, AppState};

pub async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut config = AppConfig::load()?;
    ConfigService::new().resolve_api_key(&mut config.llm);

    let llm_client = RouterClient::new(Duration::from_secs(config.llm.timeout_secs))?;

    let state = Arc::new(AppState {
        datasets: DatasetService::new(TableNormalizer::new(config.parse.clone())),
        charts: ChartResolver::new(config.chart.clone()),
        maps: GeomapBuilder::new(config.map.clone()),
        analysis: AnalysisOrchestrator::new(
            Arc::new(llm_client),
            config.llm.clone(),
            config.analysis.clone(),
        ),
        preview_rows: config.preview.rows,
    });

    let logs = Arc::new(Mutex::new(Vec::new()));
    http::add_log(&logs, "INFO", "Server", "portscope starting");

    let server = http::start_server(state, logs, &config.server)?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        "HTTP server listening"
    );

    server.await?;
    Ok(())
}

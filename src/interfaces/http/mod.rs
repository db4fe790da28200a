use crate::application::use_cases::{dataset_summary, query_engine};
use crate::application::{
    AnalysisOrchestrator, ChartResolver, Dataset, DatasetService, GeomapBuilder,
};
use crate::domain::analysis::AnalysisMode;
use crate::domain::chart::{ChartSelection, ChartSpec, ChartType};
use crate::domain::columns::{LATITUDE, PORT_NAME};
use crate::domain::error::{AnalysisFailure, AppError};
use crate::domain::gazetteer;
use crate::domain::geo::MapView;
use crate::domain::table::{ColumnType, Table};
use crate::infrastructure::config::ServerConfig;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{
    delete, dev::Server, error::InternalError, get, post, web, App, HttpResponse, HttpServer,
    Responder,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use validator::Validate;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

/// Everything the handlers need, built once at startup
pub struct AppState {
    pub datasets: DatasetService,
    pub charts: ChartResolver,
    pub maps: GeomapBuilder,
    pub analysis: AnalysisOrchestrator,
    pub preview_rows: usize,
}

pub struct HttpState {
    pub app: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize, Validate)]
pub struct UploadQuery {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
}

#[derive(Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(max = 500))]
    pub query: String,
}

#[derive(Deserialize, Validate)]
pub struct ChartRequest {
    #[serde(default)]
    pub chart_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub x_field: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub y_field: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub query: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct MapRequest {
    #[serde(default)]
    #[validate(length(max = 500))]
    pub query: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct AnalysisHttpRequest {
    pub mode: AnalysisMode,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub query: String,
    /// Search applied before the data is embedded in the prompt
    #[serde(default)]
    #[validate(length(max = 500))]
    pub filter: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnalysisFailure>,
}

#[derive(Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

#[derive(Serialize)]
pub struct DatasetInfo {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Serialize)]
pub struct DatasetOverview {
    #[serde(flatten)]
    pub info: DatasetInfo,
    pub columns: Vec<ColumnInfo>,
    pub preview: Table,
    pub notices: Vec<String>,
}

#[derive(Serialize)]
pub struct SearchResponse<'a> {
    pub total_row_count: usize,
    pub table: &'a Table,
}

#[derive(Serialize)]
pub struct ChartResponse {
    pub spec: ChartSpec,
    pub notices: Vec<String>,
}

#[derive(Serialize)]
pub struct MapResponse {
    #[serde(flatten)]
    pub view: MapView,
    pub popups: Vec<String>,
}

#[post("/datasets")]
async fn upload_dataset(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    if let Err(e) = query.validate() {
        return fail(&data.logs, "Upload", AppError::ValidationError(e.to_string()));
    }

    add_log(
        &data.logs,
        "INFO",
        "Upload",
        &format!("Uploading {} ({} bytes)", query.file_name, body.len()),
    );

    match data.app.datasets.ingest(&body, &query.file_name) {
        Ok(dataset) => {
            add_log(
                &data.logs,
                "INFO",
                "Upload",
                &format!(
                    "Dataset {} ready: {} rows, {} columns",
                    dataset.id,
                    dataset.table.row_count(),
                    dataset.table.column_count()
                ),
            );
            HttpResponse::Created().json(overview(&dataset, data.app.preview_rows))
        }
        Err(e) => fail(&data.logs, "Upload", e),
    }
}

#[get("/datasets")]
async fn list_datasets(data: web::Data<HttpState>) -> impl Responder {
    match data.app.datasets.list() {
        Ok(datasets) => {
            let infos: Vec<DatasetInfo> = datasets.iter().map(|d| info(d)).collect();
            HttpResponse::Ok().json(infos)
        }
        Err(e) => fail(&data.logs, "Datasets", e),
    }
}

#[get("/datasets/{id}")]
async fn get_dataset(data: web::Data<HttpState>, path: web::Path<Uuid>) -> impl Responder {
    match data.app.datasets.get(&path) {
        Ok(dataset) => HttpResponse::Ok().json(overview(&dataset, data.app.preview_rows)),
        Err(e) => fail(&data.logs, "Datasets", e),
    }
}

#[delete("/datasets/{id}")]
async fn delete_dataset(data: web::Data<HttpState>, path: web::Path<Uuid>) -> impl Responder {
    match data.app.datasets.remove(&path) {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Datasets", &format!("Removed dataset {}", path));
            HttpResponse::NoContent().finish()
        }
        Err(e) => fail(&data.logs, "Datasets", e),
    }
}

#[get("/datasets/{id}/summary")]
async fn summarize_dataset(data: web::Data<HttpState>, path: web::Path<Uuid>) -> impl Responder {
    match data.app.datasets.get(&path) {
        Ok(dataset) => HttpResponse::Ok().json(dataset_summary::describe(&dataset.table)),
        Err(e) => fail(&data.logs, "Summary", e),
    }
}

#[post("/datasets/{id}/search")]
async fn search_dataset(
    data: web::Data<HttpState>,
    path: web::Path<Uuid>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return fail(&data.logs, "Search", AppError::ValidationError(e.to_string()));
    }

    let dataset = match data.app.datasets.get(&path) {
        Ok(dataset) => dataset,
        Err(e) => return fail(&data.logs, "Search", e),
    };

    let view = query_engine::filter(&dataset.table, &req.query);
    add_log(
        &data.logs,
        "INFO",
        "Search",
        &format!(
            "'{}' matched {} of {} rows",
            req.query,
            view.row_count(),
            dataset.table.row_count()
        ),
    );

    HttpResponse::Ok().json(SearchResponse {
        total_row_count: dataset.table.row_count(),
        table: &view,
    })
}

#[post("/datasets/{id}/chart")]
async fn resolve_chart(
    data: web::Data<HttpState>,
    path: web::Path<Uuid>,
    req: web::Json<ChartRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return fail(&data.logs, "Chart", AppError::ValidationError(e.to_string()));
    }

    let dataset = match data.app.datasets.get(&path) {
        Ok(dataset) => dataset,
        Err(e) => return fail(&data.logs, "Chart", e),
    };

    let view = query_engine::filter(&dataset.table, req.query.as_deref().unwrap_or(""));

    let selection = match chart_selection(&req, &view) {
        Ok(selection) => selection,
        Err(e) => return fail(&data.logs, "Chart", e),
    };

    match data.app.charts.resolve(
        &view,
        selection.x_field.as_deref(),
        selection.y_field.as_deref(),
        selection.chart_type,
    ) {
        Ok(spec) => {
            add_log(&data.logs, "INFO", "Chart", &format!("Resolved '{}'", spec.title));
            HttpResponse::Ok().json(ChartResponse {
                spec,
                notices: selection.notices,
            })
        }
        Err(e) => fail(&data.logs, "Chart", e),
    }
}

#[post("/datasets/{id}/map")]
async fn build_map(
    data: web::Data<HttpState>,
    path: web::Path<Uuid>,
    req: web::Json<MapRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return fail(&data.logs, "Map", AppError::ValidationError(e.to_string()));
    }

    let dataset = match data.app.datasets.get(&path) {
        Ok(dataset) => dataset,
        Err(e) => return fail(&data.logs, "Map", e),
    };

    let view = query_engine::filter(&dataset.table, req.query.as_deref().unwrap_or(""));
    let map = data.app.maps.build_map(&view);

    add_log(
        &data.logs,
        "INFO",
        "Map",
        &format!(
            "{} markers, {} rows without coordinates",
            map.markers.len(),
            map.skipped_rows
        ),
    );

    let popups = map.markers.iter().map(|m| m.popup_text()).collect();
    HttpResponse::Ok().json(MapResponse { view: map, popups })
}

#[post("/datasets/{id}/analysis")]
async fn run_analysis(
    data: web::Data<HttpState>,
    path: web::Path<Uuid>,
    req: web::Json<AnalysisHttpRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return fail(&data.logs, "Analysis", AppError::ValidationError(e.to_string()));
    }

    let dataset = match data.app.datasets.get(&path) {
        Ok(dataset) => dataset,
        Err(e) => return fail(&data.logs, "Analysis", e),
    };

    let view = query_engine::filter(&dataset.table, req.filter.as_deref().unwrap_or(""));

    add_log(
        &data.logs,
        "INFO",
        "Analysis",
        &format!("Requesting {:?} analysis over {} rows", req.mode, view.row_count()),
    );

    match data.app.analysis.analyze(&view, req.mode, &req.query).await {
        Ok(result) => {
            add_log(
                &data.logs,
                "INFO",
                "Analysis",
                &format!("Analysis completed with {}", result.model_id),
            );
            HttpResponse::Ok().json(result)
        }
        Err(e) => fail(&data.logs, "Analysis", e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    let datasets = data.app.datasets.list().map(|d| d.len()).unwrap_or(0);
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "datasets": datasets,
        "gazetteer_ports": gazetteer::len(),
    }))
}

/// Explicit request fields win; with none at all the default bar chart is used.
fn chart_selection(req: &ChartRequest, table: &Table) -> Result<ChartSelection, AppError> {
    if req.chart_type.is_none() && req.x_field.is_none() && req.y_field.is_none() {
        return Ok(ChartResolver::default_selection(table));
    }

    let chart_type = match &req.chart_type {
        Some(tag) => tag.parse::<ChartType>()?,
        None => ChartType::Bar,
    };

    Ok(ChartSelection {
        chart_type,
        x_field: req.x_field.clone(),
        y_field: req.y_field.clone(),
        notices: Vec::new(),
    })
}

fn info(dataset: &Dataset) -> DatasetInfo {
    DatasetInfo {
        id: dataset.id,
        name: dataset.name.clone(),
        created_at: dataset.created_at,
        row_count: dataset.table.row_count(),
        column_count: dataset.table.column_count(),
    }
}

fn overview(dataset: &Dataset, preview_rows: usize) -> DatasetOverview {
    let table = &dataset.table;

    let mut notices = Vec::new();
    if !table.has_column(PORT_NAME) {
        notices.push(format!(
            "No '{}' column found, coordinates were not backfilled",
            PORT_NAME
        ));
    }
    if let Some(latitudes) = table.column(LATITUDE) {
        let missing = latitudes.values.iter().filter(|v| v.is_null()).count();
        if missing > 0 {
            notices.push(format!("{} row(s) have no coordinates and will not be mapped", missing));
        }
    }

    DatasetOverview {
        info: info(dataset),
        columns: table
            .columns()
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                kind: c.kind,
            })
            .collect(),
        preview: dataset_summary::preview(table, preview_rows),
        notices,
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        AppError::MalformedInput(_) | AppError::InsufficientNumericColumns { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::UnknownColumn(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::AnalysisService { kind, .. } => match kind {
            AnalysisFailure::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AnalysisFailure::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_GATEWAY,
        },
        AppError::ConfigError(_) | AppError::IoError(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn error_response(err: &AppError) -> HttpResponse {
    let (message, kind) = match err {
        // Upstream details go to the activity log, not to the user
        AppError::AnalysisService { kind, .. } => (kind.user_message().to_string(), Some(*kind)),
        other => (other.to_string(), None),
    };

    HttpResponse::build(status_for(err)).json(ErrorBody {
        error: err.code(),
        message,
        kind,
    })
}

fn fail(logs: &Mutex<Vec<LogEntry>>, source: &str, err: AppError) -> HttpResponse {
    let level = if status_for(&err).is_server_error() {
        "ERROR"
    } else {
        "WARN"
    };
    add_log(logs, level, source, &err.to_string());
    error_response(&err)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Routes, extractor limits and JSON error bodies for extractor failures
pub fn configure(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.app_data(web::PayloadConfig::new(max_upload_bytes))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            let response = error_response(&AppError::ValidationError(err.to_string()));
            InternalError::from_response(err, response).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            let response = error_response(&AppError::ValidationError(err.to_string()));
            InternalError::from_response(err, response).into()
        }))
        .service(
            web::scope("/api")
                .service(upload_dataset)
                .service(list_datasets)
                .service(get_dataset)
                .service(delete_dataset)
                .service(summarize_dataset)
                .service(search_dataset)
                .service(resolve_chart)
                .service(build_map)
                .service(run_analysis)
                .service(get_logs)
                .service(health),
        );
}

pub fn start_server(
    app: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    config: &ServerConfig,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app, logs });
    let max_upload_bytes = config.max_upload_bytes;

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for a local front-end

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, max_upload_bytes))
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::TableNormalizer;
    use crate::domain::analysis::{AnalysisRequest, AnalysisSettings};
    use crate::domain::chart::ChartConfig;
    use crate::domain::geo::MapConfig;
    use crate::domain::llm_config::LLMConfig;
    use crate::infrastructure::llm_clients::LLMClient;
    use actix_web::test as actix_test;
    use async_trait::async_trait;
    use serde_json::Value;

    const PORTS_CSV: &str = "Port Name,Country,MillionTEU2023\nShanghai,China,49.2\nSingapore,Singapore,39.0\nAtlantis,Nowhere,1.0\n";

    struct EchoClient;

    #[async_trait]
    impl LLMClient for EchoClient {
        async fn complete(
            &self,
            _config: &LLMConfig,
            request: &AnalysisRequest,
        ) -> crate::domain::error::Result<String> {
            Ok(format!("<think>x</think>rows={}", request.source_row_count))
        }
    }

    fn state() -> web::Data<HttpState> {
        let app = AppState {
            datasets: DatasetService::new(TableNormalizer::default()),
            charts: ChartResolver::new(ChartConfig::default()),
            maps: GeomapBuilder::new(MapConfig::default()),
            analysis: AnalysisOrchestrator::new(
                Arc::new(EchoClient),
                LLMConfig::default(),
                AnalysisSettings::default(),
            ),
            preview_rows: 5,
        };
        web::Data::new(HttpState {
            app: Arc::new(app),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    macro_rules! service {
        ($state:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(|cfg| configure(cfg, 1024 * 1024)),
            )
            .await
        };
    }

    macro_rules! upload {
        ($app:expr) => {{
            let req = actix_test::TestRequest::post()
                .uri("/api/datasets?file_name=ports.csv")
                .set_payload(PORTS_CSV)
                .to_request();
            let body: Value = actix_test::call_and_read_body_json(&$app, req).await;
            body["id"].as_str().unwrap().to_string()
        }};
    }

    #[actix_web::test]
    async fn test_upload_then_search() {
        let state = state();
        let app = service!(state);
        let id = upload!(app);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/datasets/{}/search", id))
            .set_json(serde_json::json!({ "query": "china" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["total_row_count"], 3);
        assert_eq!(body["table"]["row_count"], 1);
        let columns = body["table"]["columns"].as_array().unwrap();
        assert_eq!(columns[0]["values"][0], "Shanghai");
        assert_eq!(columns[3]["name"], "latitude");
        assert_eq!(columns[3]["values"][0], 31.2304);
    }

    #[actix_web::test]
    async fn test_upload_rejects_txt() {
        let state = state();
        let app = service!(state);

        let req = actix_test::TestRequest::post()
            .uri("/api/datasets?file_name=ports.txt")
            .set_payload(PORTS_CSV)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "unsupported_format");
    }

    #[actix_web::test]
    async fn test_default_chart_and_heatmap_error() {
        let state = state();
        let app = service!(state);
        let id = upload!(app);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/datasets/{}/chart", id))
            .set_json(serde_json::json!({}))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["spec"]["title"], "MillionTEU2023 vs Port Name");

        // latitude/longitude were backfilled, so the heatmap has three numeric columns
        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/datasets/{}/chart", id))
            .set_json(serde_json::json!({ "chart_type": "heatmap", "query": "atlantis" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["spec"]["payload"]["columns"].as_array().unwrap().len(), 3);
        assert_eq!(body["spec"]["valid"], false);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/datasets/{}/chart", id))
            .set_json(serde_json::json!({ "chart_type": "bar", "x_field": "Harbour", "y_field": "MillionTEU2023" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_map_skips_unknown_port() {
        let state = state();
        let app = service!(state);
        let id = upload!(app);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/datasets/{}/map", id))
            .set_json(serde_json::json!({}))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["markers"].as_array().unwrap().len(), 2);
        assert_eq!(body["skipped_rows"], 1);
        assert_eq!(body["popups"][0], "Port: Shanghai | Country: China | TEUs: 49.2M");
    }

    #[actix_web::test]
    async fn test_analysis_uses_filter() {
        let state = state();
        let app = service!(state);
        let id = upload!(app);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/datasets/{}/analysis", id))
            .set_json(serde_json::json!({ "mode": "data_grounded", "query": "", "filter": "singapore" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["cleaned_text"], "rows=1");
        assert_eq!(body["source_row_count"], 1);
    }

    #[actix_web::test]
    async fn test_unknown_dataset_is_404() {
        let state = state();
        let app = service!(state);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/datasets/{}/summary", Uuid::new_v4()))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&AppError::InsufficientNumericColumns { found: 1 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&AppError::analysis(AnalysisFailure::Timeout, "")),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&AppError::analysis(AnalysisFailure::RequestTooLarge, "")),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&AppError::analysis(AnalysisFailure::Authentication, "")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_log_ring_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}

//! HTTP server for the projects search API.
//!
//! The dataset is loaded once before the server starts and shared by every
//! request; each search recomputes its results from it.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | GET    | `/api/schema`     | Columns, row count and criteria schema   |
//! | POST   | `/api/options`    | Option lists for the search form         |
//! | POST   | `/api/search`     | Filtered rows, summary tables and charts |
//! | POST   | `/api/export`     | Filtered rows as `BBDD_filtrada.xlsx`    |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, error_response_with_details, OptionsRequest, SchemaResponse, SearchResponse};
use crate::error::{CriteriaError, PipelineError, ServerError, ServerResult};
use crate::export::{EXPORT_FILE_NAME, XLSX_MIME};
use crate::models::Dataset;
use crate::transform::options::{filter_options, FilterOptions};
use crate::transform::pipeline::{compute_results, export_results};
use crate::validation::{criteria_schema, parse_criteria};

/// Shared state of every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/schema", get(schema))
        .route("/api/options", post(options))
        .route("/api/search", post(search))
        .route("/api/export", post(export))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, dataset: Arc<Dataset>) -> Result<(), Box<dyn std::error::Error>> {
    let rows = dataset.len();
    let app = router(AppState { dataset });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Buscador server running on http://localhost:{}", port);
    println!("   Dataset: {} rows", rows);
    println!("   GET  /api/schema  - Columns and criteria schema");
    println!("   POST /api/options - Filter option lists");
    println!("   POST /api/search  - Search");
    println!("   POST /api/export  - Download {}", EXPORT_FILE_NAME);
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Pipeline(PipelineError::Criteria(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ServerError::Pipeline(PipelineError::Criteria(CriteriaError::Schema { errors })) => {
                error_response_with_details("Invalid criteria", errors)
            }
            other => error_response(&other.to_string()),
        };

        if status.is_server_error() {
            log_error(self.to_string());
        }
        (status, Json(body)).into_response()
    }
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "buscador",
        "version": env!("CARGO_PKG_VERSION"),
        "rows": state.dataset.len(),
        "endpoints": {
            "schema": "GET /api/schema",
            "options": "POST /api/options",
            "search": "POST /api/search",
            "export": "POST /api/export",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn schema(State(state): State<AppState>) -> Json<SchemaResponse> {
    Json(SchemaResponse::new(&state.dataset, criteria_schema()))
}

async fn options(State(state): State<AppState>, Json(request): Json<OptionsRequest>) -> Json<FilterOptions> {
    Json(filter_options(&state.dataset, &request.departments))
}

async fn search(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<Json<SearchResponse>> {
    let criteria = parse_criteria(&body)?;
    log_info(format!("New search: {}", body));

    let dataset = Arc::clone(&state.dataset);
    let response = tokio::task::spawn_blocking(move || {
        compute_results(&dataset, &criteria).map(|results| SearchResponse::from(&results))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))?
    .map_err(PipelineError::from)?;

    Ok(Json(response))
}

async fn export(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<Response> {
    let criteria = parse_criteria(&body)?;

    let dataset = Arc::clone(&state.dataset);
    let bytes = tokio::task::spawn_blocking(move || export_results(&dataset, &criteria))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the entries they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::Query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{DashError, Result};
use crate::jobs::{aggregate_by_status, Facet, FacetSelection};
use crate::source::JobSource;
use crate::view::{build_view, job_rows, legend, ChartView};

#[derive(Clone)]
pub struct DashboardState {
    pub source: Arc<dyn JobSource>,
}

impl DashboardState {
    pub fn new(source: Arc<dyn JobSource>) -> Self {
        Self { source }
    }
}

/// Facet filters from the query string. A facet key may repeat
/// (`project=A&project=B`); each value is matched exactly as given.
/// `refresh=true` forces a re-fetch before computing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    project: Vec<String>,
    proctype: Vec<String>,
    user: Vec<String>,
    refresh: bool,
}

impl FilterQuery {
    pub fn selection(&self) -> FacetSelection {
        FacetSelection::new()
            .with_projects(self.project.iter().cloned())
            .with_proctypes(self.proctype.iter().cloned())
            .with_users(self.user.iter().cloned())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    rows: usize,
    fetched_at: DateTime<Utc>,
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashError::UnknownFacet(_) => StatusCode::BAD_REQUEST,
            DashError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/view", get(view_handler))
        .route("/api/jobs", get(list_jobs_handler))
        .route("/api/summary/{facet}", get(summary_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/statuses", get(statuses_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the dashboard until `shutdown` is cancelled.
pub async fn run_dashboard(
    addr: SocketAddr,
    state: DashboardState,
    shutdown: CancellationToken,
) -> Result<()> {
    tracing::info!(addr = %addr, "Starting dashboard server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind dashboard server");
            return Err(e.into());
        }
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Dashboard server stopped");
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn view_handler(
    State(state): State<DashboardState>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse> {
    tracing::debug!(refresh = query.refresh, "update");
    let snapshot = state.source.snapshot(query.refresh).await?;
    Ok(Json(build_view(&snapshot, &query.selection())))
}

async fn list_jobs_handler(
    State(state): State<DashboardState>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse> {
    let snapshot = state.source.snapshot(query.refresh).await?;
    let filtered = snapshot.table.filter(&query.selection());
    Ok(Json(job_rows(&filtered)))
}

async fn summary_handler(
    State(state): State<DashboardState>,
    Path(facet): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse> {
    let facet: Facet = facet.parse()?;
    let snapshot = state.source.snapshot(query.refresh).await?;
    let filtered = snapshot.table.filter(&query.selection());
    Ok(Json(ChartView::from(&aggregate_by_status(&filtered, facet))))
}

async fn refresh_handler(State(state): State<DashboardState>) -> Result<impl IntoResponse> {
    let snapshot = state.source.refresh().await?;
    Ok(Json(RefreshResponse {
        rows: snapshot.table.len(),
        fetched_at: snapshot.fetched_at,
    }))
}

async fn statuses_handler() -> impl IntoResponse {
    Json(legend())
}

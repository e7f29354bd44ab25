use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, DashboardError};
use crate::shutdown::ShutdownReceiver;

use super::chart::render_chart_svg;
use super::page::render_index;
use super::state::DashboardState;

pub type SharedState = Arc<DashboardState>;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Body posted by the page's interval timer.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub n_intervals: u64,
}

#[derive(Debug)]
struct HandlerFailure {
    status: StatusCode,
    message: String,
}

impl HandlerFailure {
    fn internal(err: &AppError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    fn upstream(err: &AppError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for HandlerFailure {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "status": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

fn svg_response(svg: String) -> Response {
    ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], svg).into_response()
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chart.svg", get(chart_svg))
        .route("/api/series", get(series))
        .route("/_dash-update", post(dash_update))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<SharedState>) -> Result<Html<String>, HandlerFailure> {
    let svg = state
        .render()
        .await
        .map_err(|err| HandlerFailure::internal(&err))?;
    Ok(Html(render_index(&svg, state.settings().refresh_interval)))
}

async fn chart_svg(State(state): State<SharedState>) -> Result<Response, HandlerFailure> {
    let svg = state
        .render()
        .await
        .map_err(|err| HandlerFailure::internal(&err))?;
    Ok(svg_response(svg))
}

async fn series(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let frame = state.frame().await;
    let points: Vec<serde_json::Value> = frame
        .points()
        .map(|(timestamp, value)| {
            serde_json::json!({
                "timestamp": timestamp.to_rfc3339(),
                "value": value,
            })
        })
        .collect();
    let axis: Vec<String> = frame
        .axis
        .points()
        .iter()
        .map(chrono::DateTime::to_rfc3339)
        .collect();
    Json(serde_json::json!({
        "title": state.settings().title,
        "refresh_count": frame.refresh_count,
        "fetched_at": frame.fetched_at.to_rfc3339(),
        "axis": axis,
        "points": points,
    }))
}

async fn dash_update(
    State(state): State<SharedState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Response, HandlerFailure> {
    debug!("Interval tick {}", request.n_intervals);
    let frame = state
        .refresh()
        .await
        .map_err(|err| HandlerFailure::upstream(&err))?;
    let svg = render_chart_svg(&frame, &state.settings().title)
        .map_err(|err| HandlerFailure::internal(&err))?;
    Ok(svg_response(svg))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Binds the dashboard listener.
///
/// # Errors
///
/// Returns an error when the address cannot be bound.
pub async fn bind(host: &str, port: u16) -> AppResult<TcpListener> {
    let addr = format!("{}:{}", host, port);
    TcpListener::bind(&addr).await.map_err(|err| {
        AppError::dashboard(DashboardError::Bind {
            addr: addr.clone(),
            source: err,
        })
    })
}

/// Serves the dashboard until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error when the server fails while running.
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    mut shutdown_rx: ShutdownReceiver,
) -> AppResult<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Dashboard listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            drop(shutdown_rx.recv().await);
            info!("Dashboard shutting down");
        })
        .await
        .map_err(|err| AppError::dashboard(DashboardError::Serve { source: err }))
}

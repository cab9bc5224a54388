//! Thin HTTP surface over the engine.
//!
//! Exposes `POST /analyze` with JSON `{"url": ...}` (body capped at 5 MB)
//! and `GET /health`. Everything else — CORS, TLS termination, deployment
//! glue — belongs to the infrastructure in front of this server.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{Confidence, DetectedMap};
use crate::config::MAX_ANALYZE_REQUEST_SIZE;
use crate::engine::Engine;

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    url: String,
}

/// One technology in the response: the detection audit trail plus resolved
/// category names.
#[derive(Debug, Serialize)]
struct TechnologyReport {
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    confidence: Confidence,
    detected_by: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    categories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    technologies: BTreeMap<String, TechnologyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Builds the router. Separated from [`serve`] for testability.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_ANALYZE_REQUEST_SIZE))
        .with_state(engine)
}

/// Runs the HTTP server until the process exits.
pub async fn serve(engine: Arc<Engine>, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("analysis server listening on port {port}");
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

async fn analyze_handler(
    State(engine): State<Arc<Engine>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let url = request.url.trim().to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "url must use the http or https scheme".to_string(),
            }),
        )
            .into_response();
    }

    match engine.analyze(&url).await {
        Ok(analysis) => {
            let technologies = report(&engine, &analysis.technologies);
            let warning = analysis.error.map(|e| e.to_string());
            (
                StatusCode::OK,
                Json(AnalyzeResponse {
                    url,
                    title: analysis.title,
                    technologies,
                    warning,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("analysis of {url} failed: {e}");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse { error: e.to_string() }),
            )
                .into_response()
        }
    }
}

fn report(engine: &Engine, technologies: &DetectedMap) -> BTreeMap<String, TechnologyReport> {
    let categories = engine.categories(technologies);
    technologies
        .iter()
        .map(|(name, detection)| {
            (
                name.clone(),
                TechnologyReport {
                    version: detection.version.clone(),
                    confidence: detection.confidence,
                    detected_by: detection.detected_by.clone(),
                    categories: categories
                        .get(name)
                        .map(|info| info.names.clone())
                        .unwrap_or_default(),
                },
            )
        })
        .collect()
}

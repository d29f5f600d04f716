//! HTTP surface of the orbit lookup
//!
//! `GET /<product name>` answers with the covering orbit files as a JSON
//! array, best candidate first.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use orbit_backend::OrbitError;
use orbit_backend::index::OrbitIndex;
use orbit_backend::module::OrbitResolver;
use orbit_common::OrbitRecord;
use std::sync::Arc;
use tracing::{Instrument, error, info};

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<OrbitResolver>,
    index: Arc<dyn OrbitIndex>,
}

impl AppState {
    pub fn new(index: Arc<dyn OrbitIndex>) -> Self {
        Self {
            resolver: Arc::new(OrbitResolver::new(index.clone())),
            index,
        }
    }
}

/// Lookup failure as seen by HTTP clients
#[derive(Debug)]
pub struct ApiError(OrbitError);

impl From<OrbitError> for ApiError {
    fn from(err: OrbitError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, self.0.to_string()).into_response()
        } else {
            error!("Lookup failed: {}", self.0);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .fallback(lookup_orbits)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Stats endpoint - returns basic server information
async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = state.index.len().await.map_err(OrbitError::from)?;
    Ok(Json(serde_json::json!({
        "status": "running",
        "service": "orbit-api",
        "version": env!("CARGO_PKG_VERSION"),
        "records": records,
    })))
}

/// The request path, without its leading slashes, is the product name.
async fn lookup_orbits(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Vec<OrbitRecord>>, ApiError> {
    let product_name = uri.path().trim_start_matches('/').to_string();
    let span = tracing::info_span!(
        "lookup",
        request_id = %uuid::Uuid::now_v7(),
        product = %product_name
    );

    async move {
        let orbits = state.resolver.lookup(&product_name).await?;
        info!("Found {} covering orbit files", orbits.len());
        Ok::<_, ApiError>(Json(orbits))
    }
    .instrument(span)
    .await
}

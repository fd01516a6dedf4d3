use axum::{
    Json, Router,
    routing::get,
};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthStatus> {
    info!("GET /health - Health check");
    Json(HealthStatus {
        status: "ok",
        service: "energydash-backend",
        version: env!("CARGO_PKG_VERSION"),
    })
}

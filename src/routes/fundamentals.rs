use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::models::{FundamentalsReport, ReportingFrequency};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_fundamentals))
}

#[derive(Debug, Deserialize)]
struct FundamentalsQuery {
    frequency: Option<ReportingFrequency>,
}

pub async fn get_fundamentals(
    Path(ticker): Path<String>,
    Query(params): Query<FundamentalsQuery>,
    State(state): State<AppState>,
) -> Json<FundamentalsReport> {
    let frequency = params.frequency.unwrap_or(ReportingFrequency::Quarterly);
    info!("GET /fundamentals/{} - {:?} statements", ticker, frequency);
    let report =
        services::fundamentals_service::get_fundamentals(state.provider.as_ref(), &ticker, frequency)
            .await;
    Json(report)
}

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::QuoteSnapshot;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:ticker", get(get_quote))
}

pub async fn get_quote(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<QuoteSnapshot>, AppError> {
    info!("GET /quotes/{} - Live quote", ticker);
    services::quote_service::get_quote(&state.quotes, state.provider.as_ref(), &ticker)
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}

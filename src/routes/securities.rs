use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{ConfidenceLevel, ForecastPoint, IndicatorRow, KpiSummary, PeerSeries};
use crate::services;
use crate::state::AppState;
use crate::universe::{self, UniverseEntry};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_universe))
        .route("/compare", get(compare))
        .route("/:ticker/series", get(get_series))
        .route("/:ticker/series.csv", get(get_series_csv))
        .route("/:ticker/kpis", get(get_kpis))
        .route("/:ticker/forecast", get(get_forecast))
}

async fn list_universe() -> Json<&'static [UniverseEntry]> {
    info!("GET /securities - Listing curated universe");
    Json(universe::ENERGY_UNIVERSE)
}

pub async fn get_series(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<IndicatorRow>>, AppError> {
    info!("GET /securities/{}/series - Full indicator series", ticker);
    let rows = services::analytics_service::get_security_series(
        state.provider.as_ref(),
        &state.limiter,
        &state.cache_path,
        &ticker,
    )
    .await
    .map_err(|e| {
        match &e {
            AppError::RateLimited => warn!("Rate limited while loading series for {}", ticker),
            AppError::NotFound => warn!("No price data for {}", ticker),
            _ => error!("Failed to load series for {}: {}", ticker, e),
        }
        e
    })?;
    Ok(Json(rows))
}

pub async fn get_series_csv(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    info!("GET /securities/{}/series.csv - CSV export", ticker);
    let rows = services::analytics_service::get_security_series(
        state.provider.as_ref(),
        &state.limiter,
        &state.cache_path,
        &ticker,
    )
    .await?;
    let body = services::analytics_service::export_series_csv(&rows)?;
    let disposition = format!("attachment; filename=\"{}_data.csv\"", ticker);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn get_kpis(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<KpiSummary>, AppError> {
    info!("GET /securities/{}/kpis - KPI summary", ticker);
    services::analytics_service::get_security_kpis(
        state.provider.as_ref(),
        &state.limiter,
        &state.cache_path,
        &ticker,
    )
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
struct ForecastQuery {
    days: Option<usize>,
    confidence: Option<String>,
}

pub async fn get_forecast(
    Path(ticker): Path<String>,
    Query(params): Query<ForecastQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ForecastPoint>>, AppError> {
    let horizon = params.days.unwrap_or(30).min(365); // Cap at one year of sessions

    let confidence = params
        .confidence
        .as_deref()
        .and_then(|c| match c {
            "80" => Some(ConfidenceLevel::Eighty),
            "95" => Some(ConfidenceLevel::NinetyFive),
            _ => None,
        })
        .unwrap_or_default();

    info!(
        "GET /securities/{}/forecast - {} business days at {:?}",
        ticker, horizon, confidence
    );
    services::analytics_service::get_security_forecast(
        state.provider.as_ref(),
        &state.limiter,
        &state.cache_path,
        &ticker,
        horizon,
        confidence,
    )
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
struct CompareQuery {
    tickers: String,
    start: Option<NaiveDate>,
}

pub async fn compare(
    Query(params): Query<CompareQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PeerSeries>>, AppError> {
    let tickers: Vec<String> = params
        .tickers
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    info!("GET /securities/compare - {} tickers", tickers.len());
    services::analytics_service::compare_securities(
        state.provider.as_ref(),
        &state.limiter,
        &state.cache_path,
        &tickers,
        params.start,
    )
    .await
    .map(Json)
}

use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::market_data::{MarketDataProvider, ProviderError};
use crate::models::{
    ConfidenceLevel, ForecastPoint, IndicatorRow, KpiSummary, PeerSeries, PriceBar,
};
use crate::services::forecast_service::forecast_closes;
use crate::services::history_service;
use crate::services::indicators::enrich_with_indicators;
use crate::services::kpi_service::compute_kpis;
use crate::services::peer_service::rebase_to_100;
use crate::services::rate_limiter::RateLimiter;
use crate::universe;

/// Bars for one ticker: the cached universe table for curated symbols, a
/// direct five-year fetch for everything else.
async fn load_bars(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
    cache_path: &Path,
    ticker: &str,
) -> Result<Vec<PriceBar>, AppError> {
    if universe::contains(ticker) {
        let all = history_service::load_universe_history(provider, limiter, cache_path).await;
        Ok(all
            .into_iter()
            .filter(|b| b.ticker.eq_ignore_ascii_case(ticker))
            .collect())
    } else {
        info!("🔍 {} is outside the curated universe, fetching ad hoc", ticker);
        match history_service::fetch_adhoc_history(provider, ticker).await {
            Ok(bars) => Ok(bars),
            Err(ProviderError::NotFound) => Ok(Vec::new()),
            Err(ProviderError::RateLimited) => Err(AppError::RateLimited),
            Err(e) => Err(AppError::External(e.to_string())),
        }
    }
}

/// One security's full enriched series, oldest bar first.
pub async fn get_security_series(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
    cache_path: &Path,
    ticker: &str,
) -> Result<Vec<IndicatorRow>, AppError> {
    let bars = load_bars(provider, limiter, cache_path, ticker).await?;
    if bars.is_empty() {
        return Err(AppError::NotFound);
    }
    Ok(enrich_with_indicators(bars))
}

pub async fn get_security_kpis(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
    cache_path: &Path,
    ticker: &str,
) -> Result<KpiSummary, AppError> {
    let rows = get_security_series(provider, limiter, cache_path, ticker).await?;
    Ok(compute_kpis(&rows))
}

pub async fn get_security_forecast(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
    cache_path: &Path,
    ticker: &str,
    horizon_days: usize,
    confidence: ConfidenceLevel,
) -> Result<Vec<ForecastPoint>, AppError> {
    let rows = get_security_series(provider, limiter, cache_path, ticker).await?;
    Ok(forecast_closes(&rows, horizon_days, confidence))
}

/// Rebased comparison across curated and ad-hoc tickers.
///
/// Needs at least two distinct tickers; individual securities with no data
/// are skipped rather than failing the whole comparison. Without an
/// explicit start date the earliest available bar anchors the rebase.
pub async fn compare_securities(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
    cache_path: &Path,
    tickers: &[String],
    start: Option<NaiveDate>,
) -> Result<Vec<PeerSeries>, AppError> {
    let mut distinct: Vec<&str> = Vec::new();
    for ticker in tickers {
        if !distinct.iter().any(|t| t.eq_ignore_ascii_case(ticker)) {
            distinct.push(ticker.as_str());
        }
    }
    if distinct.len() < 2 {
        return Err(AppError::Validation(
            "peer comparison needs at least two distinct tickers".to_string(),
        ));
    }

    let cached = if distinct.iter().any(|t| universe::contains(t)) {
        history_service::load_universe_history(provider, limiter, cache_path).await
    } else {
        Vec::new()
    };

    let mut all_bars: Vec<PriceBar> = Vec::new();
    for ticker in distinct {
        if universe::contains(ticker) {
            let bars: Vec<PriceBar> = cached
                .iter()
                .filter(|b| b.ticker.eq_ignore_ascii_case(ticker))
                .cloned()
                .collect();
            if bars.is_empty() {
                warn!("⚠️ No cached bars for {}, skipping in comparison", ticker);
            } else {
                all_bars.extend(bars);
            }
        } else {
            match history_service::fetch_adhoc_history(provider, ticker).await {
                Ok(bars) if !bars.is_empty() => all_bars.extend(bars),
                Ok(_) | Err(ProviderError::NotFound) => {
                    warn!("⚠️ No data for {}, skipping in comparison", ticker);
                }
                Err(ProviderError::RateLimited) => return Err(AppError::RateLimited),
                Err(e) => {
                    warn!("✗ Fetch for {} failed, skipping in comparison: {}", ticker, e);
                }
            }
        }
    }

    let rows = enrich_with_indicators(all_bars);
    let start = match start {
        Some(date) => date,
        None => match rows.iter().map(|r| r.date).min() {
            Some(date) => date,
            None => return Ok(Vec::new()),
        },
    };
    Ok(rebase_to_100(&rows, start))
}

/// The enriched series as a downloadable CSV, headers included.
pub fn export_series_csv(rows: &[IndicatorRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| anyhow::anyhow!("CSV serialization failed: {}", e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV buffer flush failed: {}", e.error()))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV export was not UTF-8: {}", e)))
}

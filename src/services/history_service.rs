use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::external::market_data::{MarketDataProvider, ProviderError};
use crate::models::PriceBar;
use crate::services::preprocessing::normalize_price_rows;
use crate::services::rate_limiter::RateLimiter;
use crate::universe;

/// Curated-universe bars cover two years; ad-hoc tickers get five.
pub const UNIVERSE_HISTORY_DAYS: u32 = 730;
pub const ADHOC_HISTORY_DAYS: u32 = 1825;

pub fn cache_path_from_env() -> PathBuf {
    std::env::var("HISTORY_CACHE_PATH")
        .unwrap_or_else(|_| "data/energy_history.csv".to_string())
        .into()
}

/// Flat-file row mirroring `PriceBar`; blank cells round-trip as `None`.
#[derive(Debug, Serialize, Deserialize)]
struct CsvBarRow {
    ticker: String,
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: f64,
    volume: Option<f64>,
}

impl From<&PriceBar> for CsvBarRow {
    fn from(bar: &PriceBar) -> Self {
        Self {
            ticker: bar.ticker.clone(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

impl From<CsvBarRow> for PriceBar {
    fn from(row: CsvBarRow) -> Self {
        Self {
            ticker: row.ticker,
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

fn read_cache(path: &Path) -> anyhow::Result<Vec<PriceBar>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open history cache at {}", path.display()))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let row: CsvBarRow =
            result.with_context(|| format!("Bad row in history cache {}", path.display()))?;
        bars.push(row.into());
    }
    Ok(bars)
}

fn write_cache(path: &Path, bars: &[PriceBar]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create history cache at {}", path.display()))?;

    for bar in bars {
        writer.serialize(CsvBarRow::from(bar))?;
    }
    writer.flush()?;
    Ok(())
}

/// Downloads the whole curated universe through the provider, normalizing
/// per ticker. Individual ticker failures are logged and skipped.
async fn download_universe(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
) -> Vec<PriceBar> {
    let tickers = universe::all_tickers();
    info!("📥 Downloading {} universe tickers", tickers.len());

    let fetches = tickers.iter().map(|&ticker| async move {
        let _guard = limiter.acquire().await;
        match provider.fetch_daily_history(ticker, UNIVERSE_HISTORY_DAYS).await {
            Ok(rows) => {
                let bars = normalize_price_rows(ticker, &rows);
                if bars.is_empty() {
                    warn!("⚠️ No usable bars for {}", ticker);
                }
                bars
            }
            Err(e) => {
                warn!("✗ Failed to fetch history for {}: {}", ticker, e);
                Vec::new()
            }
        }
    });

    let mut bars: Vec<PriceBar> = futures::future::join_all(fetches)
        .await
        .into_iter()
        .flatten()
        .collect();
    bars.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
    bars
}

/// Curated-universe history, served from the flat CSV cache when present.
///
/// A missing file triggers a full download and a (re)write; an unreadable
/// file is logged and treated as missing. The cache is an optimization, so
/// every failure path still returns whatever bars could be produced.
pub async fn load_universe_history(
    provider: &dyn MarketDataProvider,
    limiter: &RateLimiter,
    cache_path: &Path,
) -> Vec<PriceBar> {
    if cache_path.exists() {
        match read_cache(cache_path) {
            Ok(bars) if !bars.is_empty() => {
                info!("✓ Loaded {} cached bars from {}", bars.len(), cache_path.display());
                return bars;
            }
            Ok(_) => warn!("⚠️ History cache {} is empty, refetching", cache_path.display()),
            Err(e) => warn!("⚠️ Unreadable history cache {}: {:#}", cache_path.display(), e),
        }
    }

    let bars = download_universe(provider, limiter).await;
    if bars.is_empty() {
        warn!("⚠️ Universe download produced no bars, cache not written");
        return bars;
    }

    match write_cache(cache_path, &bars) {
        Ok(()) => info!("✓ Wrote {} bars to {}", bars.len(), cache_path.display()),
        Err(e) => warn!("⚠️ Failed to write history cache: {:#}", e),
    }
    bars
}

/// Five-year history for a ticker outside the curated universe. Never cached.
pub async fn fetch_adhoc_history(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Result<Vec<PriceBar>, ProviderError> {
    let rows = provider.fetch_daily_history(ticker, ADHOC_HISTORY_DAYS).await?;
    Ok(normalize_price_rows(ticker, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::market_data::{LiveQuote, RawFundamentalsPeriod};
    use crate::models::{RawRow, ReportingFrequency};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TinyProvider {
        history_calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for TinyProvider {
        async fn fetch_daily_history(
            &self,
            _ticker: &str,
            _days: u32,
        ) -> Result<Vec<RawRow>, ProviderError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                json!({"date": "2024-01-02", "close": 10.0, "volume": 100})
                    .as_object()
                    .cloned()
                    .unwrap(),
                json!({"date": "2024-01-03", "close": 10.5, "volume": 120})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ])
        }

        async fn fetch_quote(&self, _ticker: &str) -> Result<LiveQuote, ProviderError> {
            Err(ProviderError::NotFound)
        }

        async fn fetch_fundamentals(
            &self,
            _ticker: &str,
            _frequency: ReportingFrequency,
        ) -> Result<Vec<RawFundamentalsPeriod>, ProviderError> {
            Err(ProviderError::NotFound)
        }
    }

    fn temp_cache(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("energydash-test-{}-{}.csv", std::process::id(), name))
    }

    fn sample_bars() -> Vec<PriceBar> {
        vec![
            PriceBar {
                ticker: "XOM".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: Some(10.0),
                high: None,
                low: Some(9.8),
                close: 10.2,
                volume: Some(1000.0),
            },
            PriceBar {
                ticker: "XOM".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                open: None,
                high: Some(10.9),
                low: None,
                close: 10.7,
                volume: None,
            },
        ]
    }

    #[test]
    fn cache_round_trips_missing_cells() {
        let path = temp_cache("roundtrip");
        let bars = sample_bars();
        write_cache(&path, &bars).unwrap();
        let read = read_cache(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(read.len(), 2);
        assert_eq!(read[0].high, None);
        assert_eq!(read[0].close, 10.2);
        assert_eq!(read[1].open, None);
        assert_eq!(read[1].volume, None);
        assert_eq!(read[1].date, bars[1].date);
    }

    #[tokio::test]
    async fn cold_cache_downloads_then_warm_cache_reads() {
        let path = temp_cache("coldwarm");
        std::fs::remove_file(&path).ok();
        let provider = TinyProvider { history_calls: AtomicUsize::new(0) };
        let limiter = RateLimiter::new(8, 60_000);

        let first = load_universe_history(&provider, &limiter, &path).await;
        let calls_after_first = provider.history_calls.load(Ordering::SeqCst);
        let second = load_universe_history(&provider, &limiter, &path).await;
        let calls_after_second = provider.history_calls.load(Ordering::SeqCst);
        std::fs::remove_file(&path).ok();

        assert_eq!(calls_after_first, universe::all_tickers().len());
        assert_eq!(calls_after_second, calls_after_first, "warm run must not refetch");
        assert!(!first.is_empty());
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn adhoc_fetch_normalizes_without_caching() {
        let provider = TinyProvider { history_calls: AtomicUsize::new(0) };
        let bars = fetch_adhoc_history(&provider, "FOO").await.unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].ticker, "FOO");
        assert_eq!(bars[0].open, Some(10.0), "open synthesized from close");
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::warn;

use crate::external::market_data::MarketDataProvider;
use crate::models::QuoteSnapshot;
use crate::services::preprocessing::normalize_price_rows;

/// How long a fetched snapshot stays live before the provider is asked again.
pub const QUOTE_TTL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
struct CachedQuote {
    snapshot: QuoteSnapshot,
    fetched_at: Instant,
}

/// Thread-safe short-TTL memo of live quote snapshots.
/// Staleness inside the TTL is acceptable; entries are recomputed
/// idempotently after expiry.
#[derive(Clone)]
pub struct QuoteCache {
    cache: Arc<DashMap<String, CachedQuote>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_ttl(QUOTE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn get_fresh(&self, ticker: &str) -> Option<QuoteSnapshot> {
        if let Some(entry) = self.cache.get(ticker) {
            if entry.fetched_at.elapsed() < self.ttl {
                return Some(entry.snapshot.clone());
            }
            drop(entry); // Release the read lock
            self.cache.remove(ticker);
        }
        None
    }

    fn store(&self, ticker: &str, snapshot: QuoteSnapshot) {
        self.cache.insert(
            ticker.to_string(),
            CachedQuote {
                snapshot,
                fetched_at: Instant::now(),
            },
        );
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Live snapshot for the overview cards, memoized per ticker.
///
/// Provider quote fields are preferred; when either side is missing, the
/// two most recent daily closes stand in. Every failure degrades to `None`
/// rather than an error.
pub async fn get_quote(
    cache: &QuoteCache,
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Option<QuoteSnapshot> {
    if let Some(hit) = cache.get_fresh(ticker) {
        return Some(hit);
    }

    let snapshot = fetch_snapshot(provider, ticker).await?;
    cache.store(ticker, snapshot.clone());
    Some(snapshot)
}

async fn fetch_snapshot(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Option<QuoteSnapshot> {
    let quote = match provider.fetch_quote(ticker).await {
        Ok(quote) => quote,
        Err(e) => {
            warn!("Quote fetch failed for {}: {}", ticker, e);
            Default::default()
        }
    };

    let (current_price, previous_close) = match (quote.current_price, quote.previous_close) {
        (Some(current), Some(previous)) => (current, previous),
        _ => last_two_closes(provider, ticker).await?,
    };

    let pct_change = if previous_close != 0.0 {
        Some((current_price - previous_close) / previous_close * 100.0)
    } else {
        None
    };

    Some(QuoteSnapshot {
        ticker: ticker.to_string(),
        current_price,
        previous_close,
        pct_change,
    })
}

/// Fallback when the provider exposes no live fields: (last, second-to-last)
/// daily close over the trailing week. A sole bar stands in for both sides,
/// which reads as a flat change.
async fn last_two_closes(
    provider: &dyn MarketDataProvider,
    ticker: &str,
) -> Option<(f64, f64)> {
    let rows = match provider.fetch_daily_history(ticker, 5).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Quote fallback history failed for {}: {}", ticker, e);
            return None;
        }
    };

    let bars = normalize_price_rows(ticker, &rows);
    let current = bars.last()?.close;
    let previous = if bars.len() > 1 {
        bars[bars.len() - 2].close
    } else {
        current
    };
    Some((current, previous))
}

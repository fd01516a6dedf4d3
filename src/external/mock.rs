use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::external::market_data::{
    LiveQuote, MarketDataProvider, ProviderError, RawFundamentalsPeriod,
};
use crate::models::{RawRow, ReportingFrequency};

/// Offline provider generating a seeded random walk per ticker, so a given
/// symbol keeps the same shape across requests and test runs.
pub struct MockProvider;

fn ticker_seed(ticker: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    ticker.to_ascii_uppercase().hash(&mut hasher);
    hasher.finish()
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Walks the seeded price path forward and returns (date, close) pairs for
/// roughly the trailing `days` calendar days, weekdays only.
fn walk(ticker: &str, days: u32) -> Vec<(NaiveDate, f64)> {
    let mut rng = StdRng::seed_from_u64(ticker_seed(ticker));
    let base = 20.0 + (ticker_seed(ticker) % 180) as f64;

    let today = Utc::now().date_naive();
    let start = today - Duration::days(days as i64);

    let mut out = Vec::new();
    let mut current = base;
    let mut cursor = start;
    while cursor <= today {
        if is_weekday(cursor) {
            current *= 1.0 + (rng.random::<f64>() - 0.5) * 0.02;
            out.push((cursor, current));
        }
        cursor += Duration::days(1);
    }
    out
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<RawRow>, ProviderError> {
        let mut rng = StdRng::seed_from_u64(ticker_seed(ticker).wrapping_add(1));

        let rows = walk(ticker, days)
            .into_iter()
            .map(|(date, close)| {
                let spread = close * 0.01;
                let open = close + (rng.random::<f64>() - 0.5) * spread;
                let volume = (1_000_000.0 * (0.5 + rng.random::<f64>())).round();

                let mut row = RawRow::new();
                row.insert("date".into(), Value::String(date.to_string()));
                row.insert("open".into(), Value::from(open));
                row.insert("high".into(), Value::from(open.max(close) + spread / 2.0));
                row.insert("low".into(), Value::from(open.min(close) - spread / 2.0));
                row.insert("close".into(), Value::from(close));
                row.insert("volume".into(), Value::from(volume));
                row
            })
            .collect();

        Ok(rows)
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<LiveQuote, ProviderError> {
        let closes = walk(ticker, 7);
        let mut tail = closes.iter().rev().map(|(_, c)| *c);
        Ok(LiveQuote {
            current_price: tail.next(),
            previous_close: tail.next(),
        })
    }

    async fn fetch_fundamentals(
        &self,
        ticker: &str,
        frequency: ReportingFrequency,
    ) -> Result<Vec<RawFundamentalsPeriod>, ProviderError> {
        let mut rng = StdRng::seed_from_u64(ticker_seed(ticker).wrapping_add(2));
        let base_revenue = 1.0e9 * (1.0 + (ticker_seed(ticker) % 50) as f64);

        let today = Utc::now().date_naive();
        let (count, months_step) = match frequency {
            ReportingFrequency::Quarterly => (8, 3),
            ReportingFrequency::Yearly => (4, 12),
        };

        let mut periods = Vec::with_capacity(count);
        for i in (0..count).rev() {
            let period_end = today - chrono::Months::new((months_step * (i + 1)) as u32);
            let revenue = base_revenue * (0.8 + rng.random::<f64>() * 0.4);
            let margin = 0.05 + rng.random::<f64>() * 0.1;
            periods.push(RawFundamentalsPeriod {
                period_end,
                revenue: Some(revenue),
                net_income: Some(revenue * margin),
            });
        }

        Ok(periods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn history_is_deterministic_per_ticker() {
        let provider = MockProvider;
        let a = provider.fetch_daily_history("XOM", 30).await.unwrap();
        let b = provider.fetch_daily_history("XOM", 30).await.unwrap();
        let other = provider.fetch_daily_history("CVX", 30).await.unwrap();

        assert_eq!(a.len(), b.len());
        assert_eq!(a.first(), b.first());
        assert_ne!(a.first(), other.first());
    }

    #[tokio::test]
    async fn quote_has_both_sides() {
        let provider = MockProvider;
        let quote = provider.fetch_quote("BP").await.unwrap();
        assert!(quote.current_price.is_some());
        assert!(quote.previous_close.is_some());
    }

    #[tokio::test]
    async fn fundamentals_respect_the_frequency() {
        let provider = MockProvider;
        let quarterly = provider
            .fetch_fundamentals("TTE", ReportingFrequency::Quarterly)
            .await
            .unwrap();
        let yearly = provider
            .fetch_fundamentals("TTE", ReportingFrequency::Yearly)
            .await
            .unwrap();

        assert_eq!(quarterly.len(), 8);
        assert_eq!(yearly.len(), 4);
        assert!(quarterly.windows(2).all(|w| w[0].period_end < w[1].period_end));
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{RawRow, ReportingFrequency};

/// Live quote fields a provider may expose. Either side can be absent; the
/// quote service falls back to recent historical closes.
#[derive(Debug, Clone, Default)]
pub struct LiveQuote {
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
}

/// One reporting period as delivered by a provider, before labeling.
#[derive(Debug, Clone)]
pub struct RawFundamentalsPeriod {
    pub period_end: NaiveDate,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars covering roughly the trailing `days` calendar days, as
    /// loose rows for the normalizer. At minimum a date-like and a close
    /// column are present; anything else is provider goodwill.
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<RawRow>, ProviderError>;

    async fn fetch_quote(&self, ticker: &str) -> Result<LiveQuote, ProviderError>;

    async fn fetch_fundamentals(
        &self,
        ticker: &str,
        frequency: ReportingFrequency,
    ) -> Result<Vec<RawFundamentalsPeriod>, ProviderError>;
}

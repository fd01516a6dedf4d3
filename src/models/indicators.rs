use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A price bar enriched with the derived per-security series.
///
/// `None` means the value is undefined at that bar (warm-up window, missing
/// input) and serializes as JSON null. Never encoded as 0 or NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
    pub daily_return_pct: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub volatility_20: Option<f64>,
    pub drawdown_pct: Option<f64>,
}

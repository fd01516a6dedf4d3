use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One loose input row as delivered by a provider: arbitrary column labels,
/// arbitrary value types. Normalization turns these into `PriceBar`s.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Canonical daily OHLCV bar for a single security.
///
/// A bar always has a date and a close; the remaining fields stay `None`
/// when the source cell was missing or unparsable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

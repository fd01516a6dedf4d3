use serde::{Deserialize, Serialize};

/// Live quote snapshot served to the overview cards.
///
/// `pct_change` is undefined when the previous close is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub ticker: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub pct_change: Option<f64>,
}

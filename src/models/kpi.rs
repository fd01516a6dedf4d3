use serde::{Deserialize, Serialize};

/// Scalar summary of one security's enriched series.
///
/// Every field is optional: a summary computed from an empty or degenerate
/// series is all-null rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiSummary {
    pub latest_price: Option<f64>,
    pub total_return_pct: Option<f64>,
    pub cagr_pct: Option<f64>,
    pub volatility_20: Option<f64>,
    pub downside_vol: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub win_rate_pct: Option<f64>,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single projected point on a future business day.
///
/// `upper` and `lower` bound the forecast with a flat band: the half-width
/// is constant across the horizon, it does not grow with distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Supported confidence levels for the forecast band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "80")]
    Eighty,
    #[serde(rename = "95")]
    NinetyFive,
}

impl ConfidenceLevel {
    /// Normal-quantile multiplier for the band half-width.
    pub fn z(&self) -> f64 {
        match self {
            ConfidenceLevel::Eighty => 1.28,
            ConfidenceLevel::NinetyFive => 1.96,
        }
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        ConfidenceLevel::Eighty
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One security's closes rebased so the first close in the comparison
/// window equals 100. Each series keeps its native date axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSeries {
    pub ticker: String,
    pub points: Vec<PeerPoint>,
}

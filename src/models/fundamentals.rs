use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportingFrequency {
    Quarterly,
    Yearly,
}

/// One reporting period with the two headline lines the charts use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsPeriod {
    pub period_end: NaiveDate,
    /// Chart label, "2024" for yearly periods and "2024 Q1" for quarterly.
    pub label: String,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsReport {
    pub ticker: String,
    pub frequency: ReportingFrequency,
    pub periods: Vec<FundamentalsPeriod>,
}

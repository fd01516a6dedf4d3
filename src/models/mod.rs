mod forecast;
mod fundamentals;
mod indicators;
mod kpi;
mod peer;
mod price;
mod quote;

pub use forecast::{ConfidenceLevel, ForecastPoint};
pub use fundamentals::{FundamentalsPeriod, FundamentalsReport, ReportingFrequency};
pub use indicators::IndicatorRow;
pub use kpi::KpiSummary;
pub use peer::{PeerPoint, PeerSeries};
pub use price::{PriceBar, RawRow};
pub use quote::QuoteSnapshot;

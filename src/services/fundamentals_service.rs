use chrono::Datelike;
use tracing::warn;

use crate::external::market_data::{MarketDataProvider, RawFundamentalsPeriod};
use crate::models::{FundamentalsPeriod, FundamentalsReport, ReportingFrequency};

fn label_for(period_end: chrono::NaiveDate, frequency: ReportingFrequency) -> String {
    match frequency {
        ReportingFrequency::Quarterly => {
            format!("{} Q{}", period_end.year(), period_end.month0() / 3 + 1)
        }
        ReportingFrequency::Yearly => period_end.year().to_string(),
    }
}

/// Orders raw periods, labels them for the chart axis, and drops duplicate
/// labels (restated periods keep their earliest occurrence).
pub fn build_report(
    ticker: &str,
    frequency: ReportingFrequency,
    mut raw: Vec<RawFundamentalsPeriod>,
) -> FundamentalsReport {
    raw.sort_by_key(|p| p.period_end);

    let mut periods: Vec<FundamentalsPeriod> = Vec::with_capacity(raw.len());
    for period in raw {
        let label = label_for(period.period_end, frequency);
        if periods.iter().any(|p| p.label == label) {
            continue;
        }
        periods.push(FundamentalsPeriod {
            period_end: period.period_end,
            label,
            revenue: period.revenue,
            net_income: period.net_income,
        });
    }

    FundamentalsReport {
        ticker: ticker.to_string(),
        frequency,
        periods,
    }
}

/// Revenue and net income per reporting period. Provider failures degrade
/// to an empty report; the frontend shows its "no data" note.
pub async fn get_fundamentals(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    frequency: ReportingFrequency,
) -> FundamentalsReport {
    match provider.fetch_fundamentals(ticker, frequency).await {
        Ok(raw) => build_report(ticker, frequency, raw),
        Err(e) => {
            warn!("Fundamentals fetch failed for {}: {}", ticker, e);
            build_report(ticker, frequency, Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn raw(date: &str, revenue: f64) -> RawFundamentalsPeriod {
        RawFundamentalsPeriod {
            period_end: d(date),
            revenue: Some(revenue),
            net_income: Some(revenue * 0.1),
        }
    }

    #[test]
    fn quarterly_labels_follow_calendar_quarters() {
        assert_eq!(label_for(d("2024-03-31"), ReportingFrequency::Quarterly), "2024 Q1");
        assert_eq!(label_for(d("2024-06-30"), ReportingFrequency::Quarterly), "2024 Q2");
        assert_eq!(label_for(d("2024-12-31"), ReportingFrequency::Quarterly), "2024 Q4");
        assert_eq!(label_for(d("2024-12-31"), ReportingFrequency::Yearly), "2024");
    }

    #[test]
    fn periods_are_sorted_and_deduplicated_by_label() {
        let report = build_report(
            "XOM",
            ReportingFrequency::Quarterly,
            vec![
                raw("2024-06-30", 300.0),
                raw("2024-03-31", 100.0),
                // Restatement landing in the same quarter.
                raw("2024-02-29", 90.0),
            ],
        );

        let labels: Vec<&str> = report.periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024 Q1", "2024 Q2"]);
        // The earliest occurrence of the duplicated label wins.
        assert_eq!(report.periods[0].revenue, Some(90.0));
    }

    #[test]
    fn empty_input_builds_an_empty_report() {
        let report = build_report("XOM", ReportingFrequency::Yearly, Vec::new());
        assert!(report.periods.is_empty());
        assert_eq!(report.ticker, "XOM");
    }
}

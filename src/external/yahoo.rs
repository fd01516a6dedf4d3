use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::external::market_data::{
    LiveQuote, MarketDataProvider, ProviderError, RawFundamentalsPeriod,
};
use crate::models::{RawRow, ReportingFrequency};

/// Yahoo Finance v8 chart + fundamentals-timeseries client.
///
/// No API key required, which also means no SLA: responses are treated as
/// untrusted and anything missing degrades to absent fields.
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; EnergyDash/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    // Yahoo uses "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"
    fn range_for_days(days: u32) -> &'static str {
        if days <= 5 {
            "5d"
        } else if days <= 30 {
            "1mo"
        } else if days <= 90 {
            "3mo"
        } else if days <= 180 {
            "6mo"
        } else if days <= 365 {
            "1y"
        } else if days <= 730 {
            "2y"
        } else {
            "5y"
        }
    }

    async fn fetch_chart(&self, ticker: &str, range: &str) -> Result<YahooResult, ProviderError> {
        let url = format!("https://query1.finance.yahoo.com/v8/finance/chart/{}", ticker);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("interval", "1d"),
                ("range", range),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            if resp.status().as_u16() == 404 {
                return Err(ProviderError::NotFound);
            }
            if resp.status().as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            return Err(ProviderError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body: YahooChartResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if let Some(error) = body.chart.error {
            if error.description.contains("No data found") {
                return Err(ProviderError::NotFound);
            }
            return Err(ProviderError::BadResponse(error.description));
        }

        let results = body
            .chart
            .result
            .ok_or_else(|| ProviderError::BadResponse("No results in response".into()))?;

        results.into_iter().next().ok_or(ProviderError::NotFound)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: Option<YahooMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<YahooIndicators>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "previousClose")]
    previous_close: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn num_or_null(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn series_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_daily_history(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<RawRow>, ProviderError> {
        let result = self.fetch_chart(ticker, Self::range_for_days(days)).await?;

        let indicators = result
            .indicators
            .ok_or_else(|| ProviderError::BadResponse("No indicators in response".into()))?;
        let quote = indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::BadResponse("No quote data in response".into()))?;

        if result.timestamp.is_empty() {
            return Err(ProviderError::NotFound);
        }

        let rows: Vec<RawRow> = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = chrono::DateTime::from_timestamp(ts, 0)?.date_naive();

                let mut row = RawRow::new();
                row.insert("date".into(), Value::String(date.to_string()));
                row.insert("open".into(), num_or_null(series_at(&quote.open, i)));
                row.insert("high".into(), num_or_null(series_at(&quote.high, i)));
                row.insert("low".into(), num_or_null(series_at(&quote.low, i)));
                row.insert("close".into(), num_or_null(series_at(&quote.close, i)));
                row.insert("volume".into(), num_or_null(series_at(&quote.volume, i)));
                Some(row)
            })
            .collect();

        if rows.is_empty() {
            return Err(ProviderError::NotFound);
        }

        Ok(rows)
    }

    async fn fetch_quote(&self, ticker: &str) -> Result<LiveQuote, ProviderError> {
        let result = self.fetch_chart(ticker, "5d").await?;
        let meta = result.meta.unwrap_or_default();

        Ok(LiveQuote {
            current_price: meta.regular_market_price,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
        })
    }

    async fn fetch_fundamentals(
        &self,
        ticker: &str,
        frequency: ReportingFrequency,
    ) -> Result<Vec<RawFundamentalsPeriod>, ProviderError> {
        let prefix = match frequency {
            ReportingFrequency::Quarterly => "quarterly",
            ReportingFrequency::Yearly => "annual",
        };
        let revenue_key = format!("{}TotalRevenue", prefix);
        let income_key = format!("{}NetIncome", prefix);

        let url = format!(
            "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            ticker
        );
        let period2 = Utc::now().timestamp();
        let period1 = period2 - 60 * 60 * 24 * 365 * 6;
        let type_param = format!("{},{}", revenue_key, income_key);
        let period1 = period1.to_string();
        let period2 = period2.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("type", type_param.as_str()),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("merge", "false"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            if resp.status().as_u16() == 404 {
                return Err(ProviderError::NotFound);
            }
            return Err(ProviderError::BadResponse(format!("HTTP {}", resp.status())));
        }

        // The timeseries payload nests each metric under its own key with
        // shifting shapes, so it is walked as loose JSON instead of typed.
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let results = body["timeseries"]["result"]
            .as_array()
            .ok_or_else(|| ProviderError::BadResponse("No timeseries result".into()))?;

        let mut periods: std::collections::BTreeMap<chrono::NaiveDate, (Option<f64>, Option<f64>)> =
            std::collections::BTreeMap::new();

        for item in results {
            let Some(metric) = item["meta"]["type"][0].as_str() else {
                continue;
            };
            let Some(values) = item[metric].as_array() else {
                continue;
            };
            for value in values {
                let Some(as_of) = value["asOfDate"]
                    .as_str()
                    .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                else {
                    continue;
                };
                let raw = value["reportedValue"]["raw"].as_f64();
                let entry = periods.entry(as_of).or_insert((None, None));
                if metric == revenue_key {
                    entry.0 = raw;
                } else if metric == income_key {
                    entry.1 = raw;
                }
            }
        }

        Ok(periods
            .into_iter()
            .map(|(period_end, (revenue, net_income))| RawFundamentalsPeriod {
                period_end,
                revenue,
                net_income,
            })
            .collect())
    }
}

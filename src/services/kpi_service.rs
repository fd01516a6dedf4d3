use crate::models::{IndicatorRow, KpiSummary};
use crate::services::indicators::{daily_returns_pct, drawdown_pct};

/// Rows making up the trailing 52-week window at daily resolution.
const TRADING_DAYS_52W: usize = 252;

fn sample_std(obs: &[f64]) -> Option<f64> {
    if obs.len() < 2 {
        return None;
    }
    let n = obs.len() as f64;
    let mean = obs.iter().sum::<f64>() / n;
    let variance = obs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Collapses one security's enriched series into the scalar card set.
///
/// Degenerate input degrades field by field: an empty series produces the
/// all-null summary, a single bar has no returns so the return-derived
/// fields stay null, and so on. Never an error.
pub fn compute_kpis(rows: &[IndicatorRow]) -> KpiSummary {
    if rows.is_empty() {
        return KpiSummary::default();
    }

    let mut ordered: Vec<&IndicatorRow> = rows.iter().collect();
    ordered.sort_by_key(|r| r.date);

    let first = ordered[0];
    let last = ordered[ordered.len() - 1];

    let closes: Vec<f64> = ordered.iter().map(|r| r.close).collect();
    let returns = daily_returns_pct(&closes);
    let drawdowns = drawdown_pct(&returns);

    let total_return_pct = if first.close > 0.0 {
        Some((last.close / first.close - 1.0) * 100.0)
    } else {
        None
    };

    let cagr_pct = {
        let days = (last.date - first.date).num_days();
        if days > 0 && first.close > 0.0 && last.close / first.close > 0.0 {
            let years = days as f64 / 365.25;
            let growth = (last.close / first.close).powf(1.0 / years);
            Some((growth - 1.0) * 100.0).filter(|v| v.is_finite())
        } else {
            None
        }
    };

    let tail_52w = &ordered[ordered.len().saturating_sub(TRADING_DAYS_52W)..];
    let high_52w = tail_52w
        .iter()
        .filter_map(|r| r.high)
        .fold(None, |acc: Option<f64>, h| Some(acc.map_or(h, |a| a.max(h))));
    let low_52w = tail_52w
        .iter()
        .filter_map(|r| r.low)
        .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.min(l))));

    let valid_returns: Vec<f64> = returns.iter().filter_map(|&r| r).collect();
    // The first bar's return is undefined and stays out of the denominator.
    let win_rate_pct = if valid_returns.is_empty() {
        None
    } else {
        let positives = valid_returns.iter().filter(|&&r| r > 0.0).count();
        Some(positives as f64 / valid_returns.len() as f64 * 100.0)
    };

    let negatives: Vec<f64> = valid_returns.iter().copied().filter(|&r| r < 0.0).collect();
    let downside_vol = sample_std(&negatives);

    let max_drawdown = drawdowns
        .iter()
        .filter_map(|&d| d)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))));

    KpiSummary {
        latest_price: Some(last.close),
        total_return_pct,
        cagr_pct,
        volatility_20: last.volatility_20,
        downside_vol,
        max_drawdown,
        high_52w,
        low_52w,
        win_rate_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::indicators::enrich_with_indicators;
    use crate::models::PriceBar;
    use chrono::{Duration, NaiveDate};

    fn series(closes: &[f64]) -> Vec<IndicatorRow> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                ticker: "XOM".to_string(),
                date: start + Duration::days(i as i64),
                open: Some(close),
                high: Some(close * 1.01),
                low: Some(close * 0.99),
                close,
                volume: Some(1000.0),
            })
            .collect();
        enrich_with_indicators(bars)
    }

    #[test]
    fn empty_series_yields_all_null_summary() {
        let summary = compute_kpis(&[]);
        assert!(summary.latest_price.is_none());
        assert!(summary.total_return_pct.is_none());
        assert!(summary.cagr_pct.is_none());
        assert!(summary.volatility_20.is_none());
        assert!(summary.downside_vol.is_none());
        assert!(summary.max_drawdown.is_none());
        assert!(summary.high_52w.is_none());
        assert!(summary.low_52w.is_none());
        assert!(summary.win_rate_pct.is_none());
    }

    #[test]
    fn steady_climb_wins_every_bar_and_never_draws_down() {
        let closes: Vec<f64> = (0..120).map(|i| 50.0 + i as f64 * 0.5).collect();
        let summary = compute_kpis(&series(&closes));

        assert_eq!(summary.win_rate_pct, Some(100.0));
        assert_eq!(summary.max_drawdown, Some(0.0));
        assert!(summary.total_return_pct.unwrap() > 0.0);
        assert!(summary.downside_vol.is_none(), "no negative returns to measure");
    }

    #[test]
    fn halving_shows_in_max_drawdown() {
        let mut closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        closes.push(74.5); // peak 149 halved
        let summary = compute_kpis(&series(&closes));

        let dd = summary.max_drawdown.unwrap();
        assert!((dd - -50.0).abs() < 1e-6, "max drawdown was {}", dd);
    }

    #[test]
    fn single_bar_degrades_field_by_field() {
        let summary = compute_kpis(&series(&[42.0]));

        assert_eq!(summary.latest_price, Some(42.0));
        assert_eq!(summary.total_return_pct, Some(0.0));
        assert!(summary.cagr_pct.is_none(), "zero-day span has no growth rate");
        assert!(summary.win_rate_pct.is_none());
        assert!(summary.downside_vol.is_none());
        assert_eq!(summary.max_drawdown, Some(0.0));
    }

    #[test]
    fn cagr_annualizes_a_two_year_doubling() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let rows = vec![
            IndicatorRow {
                ticker: "XOM".to_string(),
                date: start,
                open: None,
                high: None,
                low: None,
                close: 100.0,
                volume: None,
                daily_return_pct: None,
                ma_20: None,
                ma_50: None,
                volatility_20: None,
                drawdown_pct: Some(0.0),
            },
            IndicatorRow {
                ticker: "XOM".to_string(),
                date: start + Duration::days(730),
                open: None,
                high: None,
                low: None,
                close: 200.0,
                volume: None,
                daily_return_pct: Some(100.0),
                ma_20: None,
                ma_50: None,
                volatility_20: None,
                drawdown_pct: Some(0.0),
            },
        ];
        let summary = compute_kpis(&rows);

        let cagr = summary.cagr_pct.unwrap();
        assert!(cagr > 41.0 && cagr < 42.0, "two-year doubling is ~41.4%, got {}", cagr);
        assert_eq!(summary.total_return_pct, Some(100.0));
    }

    #[test]
    fn extremes_use_the_trailing_252_rows_only() {
        // An early spike to 500 falls outside the trailing window.
        let mut closes = vec![500.0];
        closes.extend((0..260).map(|i| 100.0 + (i % 7) as f64));
        let rows = series(&closes);
        let summary = compute_kpis(&rows);

        assert!(summary.high_52w.unwrap() < 200.0, "spike outside window must not count");
        assert!(summary.low_52w.unwrap() > 90.0);
    }

    #[test]
    fn unsorted_input_is_reordered_before_aggregating() {
        let mut rows = series(&[100.0, 110.0, 121.0]);
        rows.reverse();
        let summary = compute_kpis(&rows);

        assert_eq!(summary.latest_price, Some(121.0));
        assert!((summary.total_return_pct.unwrap() - 21.0).abs() < 1e-9);
        assert_eq!(summary.win_rate_pct, Some(100.0));
    }
}

use crate::models::{IndicatorRow, PriceBar};

/// Moving-average windows with the observation counts at which they become
/// defined. Below the minimum the value is `None`, never a partial mean.
pub const MA_SHORT_WINDOW: usize = 20;
pub const MA_SHORT_MIN_PERIODS: usize = 5;
pub const MA_LONG_WINDOW: usize = 50;
pub const MA_LONG_MIN_PERIODS: usize = 10;
pub const VOLATILITY_WINDOW: usize = 20;
pub const VOLATILITY_MIN_PERIODS: usize = 5;

/// Day-over-day percent change of closes.
/// Returns a vector aligned with `closes`:
/// - `None` at the first bar (no prior close)
/// - `None` wherever the prior close is not strictly positive
pub fn daily_returns_pct(closes: &[f64]) -> Vec<Option<f64>> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            if i == 0 {
                return None;
            }
            let prev = closes[i - 1];
            if prev > 0.0 {
                Some((close / prev - 1.0) * 100.0)
            } else {
                None
            }
        })
        .collect()
}

/// Trailing mean over at most `window` values.
/// Emits `Some` once at least `min_periods` observations are in the window,
/// averaging over however many are actually there.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let min_periods = min_periods.max(1);

    // Running sum via scan; the value falling out of the window is subtracted.
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let count = (i + 1).min(window);
            let out = if count >= min_periods {
                Some(*sum / count as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect()
}

/// Trailing sample standard deviation over at most `window` values.
/// Undefined (`None`) entries in the input do not count toward `min_periods`.
pub fn rolling_std(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    // Sample deviation needs at least two observations.
    let min_periods = min_periods.max(2);

    (0..values.len())
        .map(|i| {
            let lo = (i + 1).saturating_sub(window);
            let obs: Vec<f64> = values[lo..=i].iter().filter_map(|&v| v).collect();
            if obs.len() < min_periods {
                return None;
            }
            let n = obs.len() as f64;
            let mean = obs.iter().sum::<f64>() / n;
            let variance = obs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0);
            Some(variance.sqrt())
        })
        .collect()
}

/// Percent distance of the cumulative return index from its running peak.
///
/// The index starts at 1 before any return lands, so the first bar reads
/// exactly 0, as does every bar setting a new high. Undefined returns leave
/// the index unchanged. Always ≤ 0.
pub fn drawdown_pct(returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(returns.len());
    let mut cumulative = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;

    for r in returns {
        if let Some(r) = r {
            cumulative *= 1.0 + r / 100.0;
        }
        peak = peak.max(cumulative);
        out.push(Some((cumulative / peak - 1.0) * 100.0));
    }

    out
}

/// Enriches canonical bars with the derived per-security series.
///
/// Bars are partitioned by ticker and ordered by date; every window and
/// cumulative state is computed inside its partition only, so the first bar
/// of each security has an undefined return no matter how the input was
/// interleaved. No rows are added or dropped.
pub fn enrich_with_indicators(mut bars: Vec<PriceBar>) -> Vec<IndicatorRow> {
    bars.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));

    let mut out: Vec<IndicatorRow> = Vec::with_capacity(bars.len());
    let mut start = 0;
    while start < bars.len() {
        let mut end = start + 1;
        while end < bars.len() && bars[end].ticker == bars[start].ticker {
            end += 1;
        }
        enrich_partition(&bars[start..end], &mut out);
        start = end;
    }
    out
}

fn enrich_partition(bars: &[PriceBar], out: &mut Vec<IndicatorRow>) {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let returns = daily_returns_pct(&closes);
    let ma_20 = rolling_mean(&closes, MA_SHORT_WINDOW, MA_SHORT_MIN_PERIODS);
    let ma_50 = rolling_mean(&closes, MA_LONG_WINDOW, MA_LONG_MIN_PERIODS);
    let volatility_20 = rolling_std(&returns, VOLATILITY_WINDOW, VOLATILITY_MIN_PERIODS);
    let drawdown = drawdown_pct(&returns);

    for (i, bar) in bars.iter().enumerate() {
        out.push(IndicatorRow {
            ticker: bar.ticker.clone(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            daily_return_pct: returns[i],
            ma_20: ma_20[i],
            ma_50: ma_50[i],
            volatility_20: volatility_20[i],
            drawdown_pct: drawdown[i],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bar(ticker: &str, day: i64, close: f64) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day);
        PriceBar {
            ticker: ticker.to_string(),
            date,
            open: Some(close),
            high: Some(close + 0.5),
            low: Some(close - 0.5),
            close,
            volume: Some(1000.0),
        }
    }

    fn sample_std(obs: &[f64]) -> f64 {
        let n = obs.len() as f64;
        let mean = obs.iter().sum::<f64>() / n;
        (obs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0)).sqrt()
    }

    #[test]
    fn first_return_is_undefined() {
        let returns = daily_returns_pct(&[10.0, 11.0, 9.9]);
        assert_eq!(returns[0], None);
        assert!((returns[1].unwrap() - 10.0).abs() < 1e-9);
        assert!((returns[2].unwrap() - -10.0).abs() < 1e-9);
    }

    #[test]
    fn return_is_undefined_after_nonpositive_close() {
        let returns = daily_returns_pct(&[10.0, 0.0, 5.0]);
        assert!((returns[1].unwrap() - -100.0).abs() < 1e-9);
        assert_eq!(returns[2], None, "division by a zero close must not happen");
    }

    #[test]
    fn rolling_mean_respects_min_periods() {
        let values: Vec<f64> = (1..=25).map(|i| i as f64).collect();
        let ma = rolling_mean(&values, 20, 5);

        for i in 0..4 {
            assert!(ma[i].is_none(), "bar {} is inside the warm-up window", i);
        }
        // Fifth bar averages the five values seen so far.
        assert!((ma[4].unwrap() - 3.0).abs() < 1e-9);
        // Once the window is full it holds exactly 20 values.
        let expected: f64 = (5..=24).map(|i| i as f64 + 1.0).sum::<f64>() / 20.0;
        assert!((ma[24].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn rolling_std_counts_only_defined_observations() {
        let returns = daily_returns_pct(&[10.0, 11.0, 10.0, 12.0, 11.0, 13.0]);
        let vol = rolling_std(&returns, 20, 5);

        // Only four defined returns exist through index 4.
        for i in 0..5 {
            assert!(vol[i].is_none());
        }
        let obs: Vec<f64> = returns[1..=5].iter().map(|r| r.unwrap()).collect();
        assert!((vol[5].unwrap() - sample_std(&obs)).abs() < 1e-9);
    }

    #[test]
    fn drawdown_is_zero_at_first_bar_and_new_highs() {
        let returns = daily_returns_pct(&[10.0, 11.0, 10.0, 12.0]);
        let dd = drawdown_pct(&returns);

        assert_eq!(dd[0], Some(0.0));
        assert_eq!(dd[1], Some(0.0), "a new high reads zero");
        assert!(dd[2].unwrap() < 0.0);
        assert_eq!(dd[3], Some(0.0), "recovery above the old peak reads zero");
        assert!(dd.iter().all(|d| d.unwrap() <= 1e-12));
    }

    #[test]
    fn drawdown_matches_a_simple_crash() {
        let returns = daily_returns_pct(&[100.0, 50.0]);
        let dd = drawdown_pct(&returns);
        assert!((dd[1].unwrap() - -50.0).abs() < 1e-9);
    }

    #[test]
    fn enrich_keeps_every_row_and_aligns_series() {
        let bars: Vec<PriceBar> = (0..30).map(|i| bar("XOM", i, 50.0 + i as f64)).collect();
        let rows = enrich_with_indicators(bars);

        assert_eq!(rows.len(), 30);
        assert_eq!(rows[0].daily_return_pct, None);
        assert!(rows[0].ma_20.is_none());
        assert!(rows[4].ma_20.is_some());
        assert!(rows[8].ma_50.is_none());
        assert!(rows[9].ma_50.is_some());
        assert!(rows[29].volatility_20.is_some());
        assert_eq!(rows[0].drawdown_pct, Some(0.0));
    }

    #[test]
    fn window_state_never_crosses_a_ticker_boundary() {
        // Interleave two securities; each partition must start fresh.
        let mut bars = Vec::new();
        for i in 0..10 {
            bars.push(bar("CVX", i, 150.0 + i as f64));
            bars.push(bar("XOM", i, 50.0 + i as f64));
        }
        let rows = enrich_with_indicators(bars);

        assert_eq!(rows.len(), 20);
        // Output is grouped by ticker, dates ascending inside each group.
        assert!(rows[..10].iter().all(|r| r.ticker == "CVX"));
        assert!(rows[10..].iter().all(|r| r.ticker == "XOM"));
        assert_eq!(rows[0].daily_return_pct, None);
        assert_eq!(rows[10].daily_return_pct, None, "second partition starts fresh");
        // A 150-to-51 "jump" would be a huge negative return if state leaked.
        let xom_first = &rows[10];
        assert_eq!(xom_first.drawdown_pct, Some(0.0));
        assert!(rows[11].daily_return_pct.unwrap() > 0.0);
    }
}

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::{ConfidenceLevel, ForecastPoint, IndicatorRow};

/// Bars of history required before a forecast is attempted.
pub const MIN_HISTORY_BARS: usize = 60;

/// Default extrapolation horizon in business days.
pub const DEFAULT_HORIZON_DAYS: usize = 30;

// Holt's linear trend method (double exponential smoothing)
const ALPHA: f64 = 0.3; // Level smoothing parameter
const BETA: f64 = 0.1; // Trend smoothing parameter

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The `count` business days following `last`, weekends skipped.
fn business_days_after(last: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(count);
    let mut cursor = last;
    while out.len() < count {
        cursor += Duration::days(1);
        if is_business_day(cursor) {
            out.push(cursor);
        }
    }
    out
}

/// Extrapolates one security's closes `horizon_days` business days forward.
///
/// Holt's method is fitted over the whole history; the point forecast at
/// step h is `level + h * trend`. The band half-width is `z * σ` where σ is
/// the sample standard deviation of the one-step-ahead residuals, applied
/// uniformly across the horizon. The flat band is a deliberate
/// simplification, not a rigorous prediction interval.
///
/// Returns an empty vector when fewer than [`MIN_HISTORY_BARS`] bars exist
/// or the fit degenerates, never an error.
pub fn forecast_closes(
    rows: &[IndicatorRow],
    horizon_days: usize,
    confidence: ConfidenceLevel,
) -> Vec<ForecastPoint> {
    if rows.len() < MIN_HISTORY_BARS || horizon_days == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&IndicatorRow> = rows.iter().collect();
    ordered.sort_by_key(|r| r.date);
    let values: Vec<f64> = ordered.iter().map(|r| r.close).collect();

    let mut level = values[0];
    let mut trend = values[1] - values[0];
    let mut residuals = Vec::with_capacity(values.len() - 1);

    for &value in &values[1..] {
        // One-step-ahead error against the state before this observation.
        residuals.push(value - (level + trend));

        let prev_level = level;
        level = ALPHA * value + (1.0 - ALPHA) * (level + trend);
        trend = BETA * (level - prev_level) + (1.0 - BETA) * trend;
    }

    let Some(sigma) = sample_std(&residuals) else {
        return Vec::new();
    };
    if !level.is_finite() || !trend.is_finite() || !sigma.is_finite() {
        return Vec::new();
    }

    let z = confidence.z();
    let half_width = z * sigma;
    let last_date = ordered[ordered.len() - 1].date;

    business_days_after(last_date, horizon_days)
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let step = (i + 1) as f64;
            let forecast = level + step * trend;
            ForecastPoint {
                date,
                forecast,
                upper: forecast + half_width,
                lower: forecast - half_width,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBar;
    use crate::services::indicators::enrich_with_indicators;

    fn series(closes: &[f64]) -> Vec<IndicatorRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                ticker: "CVX".to_string(),
                date: start + Duration::days(i as i64),
                open: Some(close),
                high: Some(close),
                low: Some(close),
                close,
                volume: Some(0.0),
            })
            .collect();
        enrich_with_indicators(bars)
    }

    #[test]
    fn too_little_history_yields_empty_forecast() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let points = forecast_closes(&series(&closes), 30, ConfidenceLevel::Eighty);
        assert!(points.is_empty());
    }

    #[test]
    fn linear_history_extrapolates_the_slope() {
        // 90 bars climbing exactly 1.0 per bar.
        let closes: Vec<f64> = (0..90).map(|i| 100.0 + i as f64).collect();
        let points = forecast_closes(&series(&closes), 30, ConfidenceLevel::Eighty);

        assert_eq!(points.len(), 30);
        let last_close = 189.0;
        // The fitted trend on a clean line is the line's slope.
        let steps: Vec<f64> = points.windows(2).map(|w| w[1].forecast - w[0].forecast).collect();
        for s in &steps {
            assert!((s - 1.0).abs() < 0.05, "consecutive forecasts should climb ~1.0, got {}", s);
        }
        assert!(points[0].forecast > last_close);
        for p in &points {
            assert!(p.upper >= p.forecast);
            assert!(p.lower <= p.forecast);
        }
    }

    #[test]
    fn band_half_width_is_flat_across_the_horizon() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + i as f64 * 0.3 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let points = forecast_closes(&series(&closes), 20, ConfidenceLevel::NinetyFive);

        let first_width = points[0].upper - points[0].lower;
        assert!(first_width > 0.0);
        for p in &points {
            let width = p.upper - p.lower;
            assert!((width - first_width).abs() < 1e-9, "band must not widen with distance");
        }
    }

    #[test]
    fn wider_confidence_gives_wider_band() {
        let closes: Vec<f64> = (0..90)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0)
            .collect();
        let eighty = forecast_closes(&series(&closes), 5, ConfidenceLevel::Eighty);
        let ninety_five = forecast_closes(&series(&closes), 5, ConfidenceLevel::NinetyFive);

        let w80 = eighty[0].upper - eighty[0].lower;
        let w95 = ninety_five[0].upper - ninety_five[0].lower;
        assert!(w95 > w80);
        // Same point forecast, only the band changes.
        assert!((eighty[0].forecast - ninety_five[0].forecast).abs() < 1e-12);
    }

    #[test]
    fn forecast_dates_are_future_business_days() {
        // History ending on a Friday; the forecast resumes on Monday.
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let mut rows = series(&closes);
        // 2024-01-01 + 59 days = 2024-02-29 (Thursday); shift so the series ends Friday.
        let shift = Duration::days(1);
        for r in &mut rows {
            r.date += shift;
        }
        let last = rows.last().unwrap().date;
        assert_eq!(last.weekday(), Weekday::Fri);

        let points = forecast_closes(&rows, 6, ConfidenceLevel::Eighty);
        assert_eq!(points[0].date, last + Duration::days(3), "weekend skipped");
        for p in &points {
            assert!(is_business_day(p.date));
            assert!(p.date > last);
        }
    }

    #[test]
    fn constant_history_forecasts_the_constant() {
        let closes = vec![100.0; 80];
        let points = forecast_closes(&series(&closes), 10, ConfidenceLevel::Eighty);
        // level stays at 100, trend at 0, residuals all zero.
        assert_eq!(points.len(), 10);
        for p in &points {
            assert!((p.forecast - 100.0).abs() < 1e-9);
            assert!((p.upper - p.forecast).abs() < 1e-9);
        }
    }
}

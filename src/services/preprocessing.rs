use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{PriceBar, RawRow};

/// Canonical fields a raw table can carry. Column labels are matched
/// case-insensitively on their base name, so flattened multi-level labels
/// like `Close/XOM`, `close.reliance` or `CLOSE XOM` all resolve to `close`.
const DATE_NAMES: &[&str] = &["date", "datetime", "timestamp"];

fn base_name(label: &str) -> &str {
    label
        .split(|c: char| c == '/' || c == '.' || c.is_whitespace())
        .next()
        .unwrap_or(label)
        .trim()
}

fn matches_field(label: &str, names: &[&str]) -> bool {
    let base = base_name(label);
    names.iter().any(|n| base.eq_ignore_ascii_case(n))
}

fn field<'a>(row: &'a RawRow, names: &[&str]) -> Option<&'a Value> {
    row.iter()
        .find(|(k, _)| matches_field(k, names))
        .map(|(_, v)| v)
}

/// Parses a date cell. Accepts ISO dates, ISO datetimes (date part taken),
/// the common US and slashed forms, and integer epoch seconds.
fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            let date_part = s.split(['T', ' ']).next().unwrap_or(s);
            for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
                if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
                    return Some(d);
                }
            }
            None
        }
        Value::Number(n) => {
            let secs = n.as_i64()?;
            chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

/// Coerces a cell to f64. Numeric strings may carry currency symbols,
/// thousands separators or a percent sign; anything unparsable is missing.
fn parse_numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned = s.replace('$', "").replace(',', "").replace('%', "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() || cleaned == "-" {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Turns loose provider rows into canonical bars for one security.
///
/// The whole table is rejected (empty output) when no date-like or no close
/// column exists at all. Per row: an unparsable date or a missing close
/// drops the row; missing open/high/low/volume cells degrade to `None`.
/// When the open/high/low columns are absent entirely, each is synthesized
/// as a copy of the close; an absent volume column defaults to 0.
/// Output is sorted by date ascending, and the operation is idempotent.
pub fn normalize_price_rows(ticker: &str, rows: &[RawRow]) -> Vec<PriceBar> {
    if rows.is_empty() {
        return Vec::new();
    }

    // Column presence is the union over all rows, like a frame built from
    // a list of records.
    let mut has_date = false;
    let mut has_open = false;
    let mut has_high = false;
    let mut has_low = false;
    let mut has_close = false;
    let mut has_volume = false;
    for row in rows {
        for key in row.keys() {
            if matches_field(key, DATE_NAMES) {
                has_date = true;
            } else if matches_field(key, &["open"]) {
                has_open = true;
            } else if matches_field(key, &["high"]) {
                has_high = true;
            } else if matches_field(key, &["low"]) {
                has_low = true;
            } else if matches_field(key, &["close"]) {
                has_close = true;
            } else if matches_field(key, &["volume"]) {
                has_volume = true;
            }
        }
    }

    if !has_date || !has_close {
        return Vec::new();
    }

    let mut bars: Vec<PriceBar> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(date) = field(row, DATE_NAMES).and_then(parse_date_value) else {
            continue;
        };
        let Some(close) = field(row, &["close"]).and_then(parse_numeric_value) else {
            continue;
        };

        let ohl = |present: bool, names: &[&str]| -> Option<f64> {
            if present {
                field(row, names).and_then(parse_numeric_value)
            } else {
                Some(close)
            }
        };

        let volume = if has_volume {
            field(row, &["volume"]).and_then(parse_numeric_value)
        } else {
            Some(0.0)
        };

        bars.push(PriceBar {
            ticker: ticker.to_string(),
            date,
            open: ohl(has_open, &["open"]),
            high: ohl(has_high, &["high"]),
            low: ohl(has_low, &["low"]),
            close,
            volume,
        });
    }

    bars.sort_by_key(|b| b.date);
    bars
}

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{IndicatorRow, PeerPoint, PeerSeries};

/// Rescales each security so its first close on/after `start` equals 100.
///
/// Securities with no bars in the window, or whose base close is not
/// strictly positive, are skipped entirely. Series keep their native date
/// axes; no cross-security alignment is attempted. Output is ordered by
/// ticker.
pub fn rebase_to_100(rows: &[IndicatorRow], start: NaiveDate) -> Vec<PeerSeries> {
    let mut by_ticker: BTreeMap<&str, Vec<&IndicatorRow>> = BTreeMap::new();
    for row in rows {
        if row.date >= start {
            by_ticker.entry(row.ticker.as_str()).or_default().push(row);
        }
    }

    let mut out = Vec::with_capacity(by_ticker.len());
    for (ticker, mut group) in by_ticker {
        group.sort_by_key(|r| r.date);
        let base = group[0].close;
        if base <= 0.0 {
            continue;
        }
        let points = group
            .iter()
            .map(|r| PeerPoint {
                date: r.date,
                value: r.close / base * 100.0,
            })
            .collect();
        out.push(PeerSeries {
            ticker: ticker.to_string(),
            points,
        });
    }
    out
}

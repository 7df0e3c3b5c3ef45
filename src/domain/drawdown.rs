//! Recursive worst-drawdown search over an equity curve.
//!
//! Divide and conquer: find the bar with the largest proportional decline
//! from any earlier peak, record the (peak, trough) pair, then recurse on
//! the prefix before the peak and the suffix from the trough, with a depth
//! budget. A monotonically rising sub-array yields nothing rather than an
//! error. Results are de-duplicated and sorted by depth, largest first.

use chrono::NaiveDate;

use crate::domain::returns::ReturnSeries;

pub const DEFAULT_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownRecord {
    /// Peak-to-trough decline, percent of the peak, in [0, 100].
    pub depth_pct: f64,
    pub peak: f64,
    pub trough: f64,
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    pub drawdown_days: i64,
    /// First date the curve exceeded the old peak again; when the drawdown
    /// never recovered this holds the last available date and `recovered`
    /// is false — callers must check.
    pub recovery_date: NaiveDate,
    pub recovery_days: i64,
    pub recovered: bool,
}

/// Which equity curve to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Strategy,
    Market,
}

/// Find up to `2^depth - 1` drawdowns of `values`, keeping those at least
/// `cutoff_pct` deep, sorted by depth descending.
pub fn find_drawdowns(
    dates: &[NaiveDate],
    values: &[f64],
    depth: usize,
    cutoff_pct: f64,
) -> Vec<DrawdownRecord> {
    debug_assert_eq!(dates.len(), values.len());
    let mut pairs = Vec::new();
    collect(values, 0, depth, &mut pairs);
    pairs.sort_unstable();
    pairs.dedup();

    let mut records: Vec<DrawdownRecord> = pairs
        .into_iter()
        .map(|(peak_idx, trough_idx)| {
            let peak = values[peak_idx];
            let trough = values[trough_idx];
            let (recovery_date, recovered) = values[trough_idx + 1..]
                .iter()
                .position(|&v| v > peak)
                .map(|offset| (dates[trough_idx + 1 + offset], true))
                .unwrap_or((dates[dates.len() - 1], false));
            DrawdownRecord {
                depth_pct: (1.0 - trough / peak) * 100.0,
                peak,
                trough,
                peak_date: dates[peak_idx],
                trough_date: dates[trough_idx],
                drawdown_days: (dates[trough_idx] - dates[peak_idx]).num_days(),
                recovery_date,
                recovery_days: (recovery_date - dates[trough_idx]).num_days(),
                recovered,
            }
        })
        .filter(|r| r.depth_pct >= cutoff_pct)
        .collect();

    records.sort_by(|a, b| b.depth_pct.total_cmp(&a.depth_pct));
    records
}

/// Convenience wrapper over a return series' strategy or market curve.
pub fn analyze(
    series: &ReturnSeries,
    target: Target,
    depth: usize,
    cutoff_pct: f64,
) -> Vec<DrawdownRecord> {
    match target {
        Target::Strategy => find_drawdowns(series.return_dates(), &series.equity(), depth, cutoff_pct),
        Target::Market => find_drawdowns(&series.dates, &series.last, depth, cutoff_pct),
    }
}

/// Record the deepest (peak, trough) index pair of `values` (as absolute
/// indexes via `offset`), then recurse left of the peak and right of the
/// trough until the depth budget runs out.
fn collect(values: &[f64], offset: usize, depth: usize, out: &mut Vec<(usize, usize)>) {
    if depth == 0 || values.len() < 2 {
        return;
    }

    let mut running_max = values[0];
    let mut best_ratio = 0.0;
    let mut trough = 0;
    for (t, &v) in values.iter().enumerate() {
        if v > running_max {
            running_max = v;
        }
        let ratio = (running_max - v) / v;
        if ratio > best_ratio {
            best_ratio = ratio;
            trough = t;
        }
    }
    if trough == 0 {
        // No decline anywhere (monotonically rising or flat).
        return;
    }

    let mut peak = 0;
    for (t, &v) in values[..trough].iter().enumerate() {
        if v > values[peak] {
            peak = t;
        }
    }

    out.push((offset + peak, offset + trough));
    collect(&values[..peak], offset, depth - 1, out);
    collect(&values[trough..], offset + trough, depth - 1, out);
}

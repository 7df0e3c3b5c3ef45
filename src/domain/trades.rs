//! Discrete trade extraction from buy/sell transition markers.
//!
//! A long trade opens at a buy marker where the bar's stance is positive
//! (which excludes a short merely being closed back to flat) and closes at
//! the next sell marker strictly after entry. A short trade opens at a sell
//! marker with negative stance and closes at the next buy marker. A trade
//! with no closing marker is still open at series end: its exit fields hold
//! the final bar as a mark-to-market placeholder and `open` is set.

use chrono::NaiveDate;

use crate::domain::returns::ReturnSeries;
use crate::domain::stance::Side;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub entry_date: NaiveDate,
    pub side: Side,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub holding_days: i64,
    /// Percentage return; for shorts, profit when price falls.
    pub return_pct: f64,
    /// True when the position had not closed by series end; the exit fields
    /// are then an unrealized mark, not a real trade.
    pub open: bool,
}

/// Extract trade records sorted by entry date. `long_only` skips the short
/// side entirely. Degenerate input (no markers) yields an empty list.
pub fn extract(series: &ReturnSeries, long_only: bool) -> Vec<TradeRecord> {
    let mut records = Vec::new();
    let n = series.len();
    if n == 0 {
        return records;
    }
    let final_date = series.dates[n - 1];
    let final_price = series.last[n - 1];

    for t in 0..n {
        let Some(entry_price) = series.buy[t] else {
            continue;
        };
        if series.stance[t] <= 0.0 {
            continue;
        }
        let exit = (t + 1..n).find_map(|u| series.sell[u].map(|p| (series.dates[u], p)));
        records.push(make_record(
            series.dates[t],
            Side::Long,
            entry_price,
            exit,
            final_date,
            final_price,
        ));
    }

    if !long_only {
        for t in 0..n {
            let Some(entry_price) = series.sell[t] else {
                continue;
            };
            if series.stance[t] >= 0.0 {
                continue;
            }
            let exit = (t + 1..n).find_map(|u| series.buy[u].map(|p| (series.dates[u], p)));
            records.push(make_record(
                series.dates[t],
                Side::Short,
                entry_price,
                exit,
                final_date,
                final_price,
            ));
        }
    }

    records.sort_by_key(|r| r.entry_date);
    records
}

fn make_record(
    entry_date: NaiveDate,
    side: Side,
    entry_price: f64,
    exit: Option<(NaiveDate, f64)>,
    final_date: NaiveDate,
    final_price: f64,
) -> TradeRecord {
    let (exit_date, exit_price, open) = match exit {
        Some((date, price)) => (date, price, false),
        None => (final_date, final_price, true),
    };
    let return_pct = match side {
        Side::Long => (exit_price / entry_price - 1.0) * 100.0,
        Side::Short => (entry_price / exit_price - 1.0) * 100.0,
    };
    TradeRecord {
        entry_date,
        side,
        entry_price,
        exit_date,
        exit_price,
        holding_days: (exit_date - entry_date).num_days(),
        return_pct,
        open,
    }
}

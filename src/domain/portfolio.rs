//! Multi-strategy aggregation onto a common calendar.
//!
//! Component return series are reindexed onto the sorted union of their
//! calendars; a strategy contributes 0 (flat, no return) outside its own
//! history. The aggregated output is an ordinary [`ReturnSeries`] whose
//! `last` is the blended market equity, so it feeds straight back into the
//! summarizer, trade extractor and drawdown analyzer.

use std::collections::BTreeSet;
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::error::StancetraderError;
use crate::domain::returns::{cumulative_equity, ReturnSeries};
use crate::domain::stance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Stance, market and strategy returns are weighted sums; the stance
    /// stays continuous (partial exposure).
    WeightedBlend,
    /// The weighted stance sum is collapsed to sign() and strategy returns
    /// are recomputed from that single stance with a one-bar lag.
    MajorityVote,
}

/// Combine component return series. `weights` of `None` means equal weight;
/// otherwise weights are validated (count, non-negativity, positive sum)
/// and normalized to sum 1.
pub fn aggregate(
    components: &[ReturnSeries],
    weights: Option<&[f64]>,
    policy: AggregationPolicy,
) -> Result<ReturnSeries, StancetraderError> {
    if components.is_empty() {
        return Err(StancetraderError::NoStrategies);
    }
    let weights = normalize_weights(components.len(), weights)?;

    // Common calendar: sorted union of all component dates.
    let calendar: Vec<NaiveDate> = components
        .iter()
        .flat_map(|c| c.dates.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let n = calendar.len();

    let mut stance_sum = vec![0.0; n];
    let mut market = vec![0.0; n.saturating_sub(1)];
    let mut strategy = vec![0.0; n.saturating_sub(1)];

    for (component, &w) in components.iter().zip(&weights) {
        let stance_by_date: HashMap<NaiveDate, f64> = component
            .dates
            .iter()
            .copied()
            .zip(component.stance.iter().copied())
            .collect();
        let market_by_date: HashMap<NaiveDate, f64> = component
            .return_dates()
            .iter()
            .copied()
            .zip(component.market.iter().copied())
            .collect();
        let strategy_by_date: HashMap<NaiveDate, f64> = component
            .return_dates()
            .iter()
            .copied()
            .zip(component.strategy.iter().copied())
            .collect();

        for (t, date) in calendar.iter().enumerate() {
            if let Some(&s) = stance_by_date.get(date) {
                stance_sum[t] += w * s;
            }
            if t > 0 {
                if let Some(&m) = market_by_date.get(date) {
                    market[t - 1] += w * m;
                }
                if let Some(&r) = strategy_by_date.get(date) {
                    strategy[t - 1] += w * r;
                }
            }
        }
    }

    let agg_stance: Vec<f64> = match policy {
        AggregationPolicy::WeightedBlend => stance_sum,
        AggregationPolicy::MajorityVote => stance_sum.iter().map(|&w| stance::sign(w)).collect(),
    };

    if policy == AggregationPolicy::MajorityVote {
        // Recompute strategy returns from the single collapsed stance.
        for t in 1..n {
            strategy[t - 1] = market[t - 1] * agg_stance[t - 1];
        }
    }

    // Synthetic price level: blended market equity. Keeps the output
    // re-runnable through the summarizer and drawdown analyzer.
    let mut last = Vec::with_capacity(n);
    last.push(1.0);
    last.extend(cumulative_equity(&market));

    let mut trade_size = Vec::with_capacity(n);
    let mut buy = Vec::with_capacity(n);
    let mut sell = Vec::with_capacity(n);
    for t in 0..n {
        let prev = if t == 0 { 0.0 } else { agg_stance[t - 1] };
        let diff = agg_stance[t] - prev;
        trade_size.push(diff.abs());
        buy.push((diff > 0.0).then_some(last[t]));
        sell.push((diff < 0.0).then_some(last[t]));
    }

    Ok(ReturnSeries {
        dates: calendar,
        last,
        stance: agg_stance,
        trade_size,
        buy,
        sell,
        market,
        strategy,
    })
}

fn normalize_weights(
    strategies: usize,
    weights: Option<&[f64]>,
) -> Result<Vec<f64>, StancetraderError> {
    match weights {
        None => Ok(vec![1.0 / strategies as f64; strategies]),
        Some(w) => {
            if w.len() != strategies {
                return Err(StancetraderError::WeightMismatch {
                    strategies,
                    weights: w.len(),
                });
            }
            if w.iter().any(|&x| !x.is_finite() || x < 0.0) {
                return Err(StancetraderError::InvalidWeights);
            }
            let total: f64 = w.iter().sum();
            if total <= 0.0 {
                return Err(StancetraderError::InvalidWeights);
            }
            Ok(w.iter().map(|&x| x / total).collect())
        }
    }
}

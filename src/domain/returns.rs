//! Return engine: stance sequence -> causally-correct log returns.
//!
//! Market return over bar t is `ln(last[t]/last[t-1])`; the first bar has no
//! market return, so `market` and `strategy` are (n-1)-length and aligned to
//! `dates[1..]`. The stance effective over bar t is `stance[t-1]` (one-bar
//! execution lag): a signal generated on a close cannot be acted on until
//! the next bar. Slippage is charged to the bar after a position change,
//! proportional to the size of the change and the direction then held.
//!
//! Buy/sell markers record the price at each stance transition (positive
//! diff = buy, negative diff = sell, prior stance 0-filled) and feed the
//! trade extractor and any plotting surface.

use chrono::NaiveDate;

use crate::domain::error::StancetraderError;
use crate::domain::series::PriceSeries;

/// Output of a single engine run. Every stage downstream (trades, summary,
/// drawdowns, portfolio aggregation) consumes this structure without
/// mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    /// Bar dates, length n.
    pub dates: Vec<NaiveDate>,
    /// Last-trade price per bar, length n. For aggregated portfolios this
    /// is a synthetic level (blended market equity).
    pub last: Vec<f64>,
    /// Stance per bar, length n. Discrete for single strategies, possibly
    /// continuous for blended portfolios.
    pub stance: Vec<f64>,
    /// `|stance[t] - stance[t-1]|` with the prior stance 0-filled, length n.
    pub trade_size: Vec<f64>,
    /// Price at positive stance transitions, length n.
    pub buy: Vec<Option<f64>>,
    /// Price at negative stance transitions, length n.
    pub sell: Vec<Option<f64>>,
    /// Market log returns aligned to `dates[1..]`, length n-1.
    pub market: Vec<f64>,
    /// Strategy log returns aligned to `dates[1..]`, length n-1.
    pub strategy: Vec<f64>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Dates the return vectors are aligned to.
    pub fn return_dates(&self) -> &[NaiveDate] {
        &self.dates[1..]
    }

    /// Cumulative strategy equity, `exp(cumsum(strategy))`, length n-1.
    pub fn equity(&self) -> Vec<f64> {
        cumulative_equity(&self.strategy)
    }

    /// Cumulative market equity, length n-1.
    pub fn market_equity(&self) -> Vec<f64> {
        cumulative_equity(&self.market)
    }

    pub fn current_stance(&self) -> f64 {
        *self.stance.last().unwrap_or(&0.0)
    }

    /// Price of the most recent buy marker, if any.
    pub fn last_buy(&self) -> Option<f64> {
        self.buy.iter().rev().find_map(|&p| p)
    }

    /// Price of the most recent sell marker, if any.
    pub fn last_sell(&self) -> Option<f64> {
        self.sell.iter().rev().find_map(|&p| p)
    }
}

/// Compound log returns into an equity curve starting from 1.0.
pub fn cumulative_equity(log_returns: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    log_returns
        .iter()
        .map(|r| {
            acc += r;
            acc.exp()
        })
        .collect()
}

/// Run the return engine over a price series and an aligned stance sequence.
///
/// `slippage` is a per-unit transaction cost: a stance change of size s at
/// bar t-1 costs `s * slippage` against the return realized over bar t.
pub fn run(
    prices: &PriceSeries,
    stance: &[f64],
    slippage: f64,
) -> Result<ReturnSeries, StancetraderError> {
    let n = prices.len();
    if stance.len() != n {
        return Err(StancetraderError::StanceMismatch {
            bars: n,
            stances: stance.len(),
        });
    }

    let dates = prices.dates();
    let last = prices.closes();

    let mut trade_size = Vec::with_capacity(n);
    let mut buy = Vec::with_capacity(n);
    let mut sell = Vec::with_capacity(n);
    for t in 0..n {
        let prev = if t == 0 { 0.0 } else { stance[t - 1] };
        let diff = stance[t] - prev;
        trade_size.push(diff.abs());
        buy.push((diff > 0.0).then_some(last[t]));
        sell.push((diff < 0.0).then_some(last[t]));
    }

    let mut market = Vec::with_capacity(n.saturating_sub(1));
    let mut strategy = Vec::with_capacity(n.saturating_sub(1));
    for t in 1..n {
        let mkt = (last[t] / last[t - 1]).ln();
        let adj = mkt - trade_size[t - 1] * slippage * stance[t - 1];
        market.push(mkt);
        strategy.push(adj * stance[t - 1]);
    }

    Ok(ReturnSeries {
        dates,
        last,
        stance: stance.to_vec(),
        trade_size,
        buy,
        sell,
        market,
        strategy,
    })
}

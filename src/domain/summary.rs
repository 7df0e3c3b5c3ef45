//! Aggregate performance statistics for a return series.
//!
//! Figures are rounded to two decimals here because the summary *is* the
//! report; everything upstream keeps full precision. A zero-variance return
//! stream makes the Sharpe ratio NaN (a flat-always strategy is legitimate),
//! so callers must check rather than expect a finite value.

use std::fmt;

use crate::domain::error::StancetraderError;
use crate::domain::returns::ReturnSeries;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Total compounded strategy return, percent.
    pub strategy_pct: f64,
    /// Total compounded market (buy-and-hold) return, percent.
    pub market_pct: f64,
    /// Annualized strategy return, percent.
    pub strategy_pa_pct: f64,
    /// Annualized market return, percent.
    pub market_pa_pct: f64,
    /// Annualized Sharpe ratio of strategy returns; NaN on zero variance.
    pub sharpe: f64,
    /// Annualized Sharpe ratio of market returns; NaN on zero variance.
    pub market_sharpe: f64,
    /// Number of stance transitions (bar 0 counts only if it opens a position).
    pub trades: usize,
    pub trades_per_month: f64,
    pub years: f64,
    /// Stance held on the final bar.
    pub current_stance: f64,
    /// Mark-to-market return of the open position, percent; 0 when flat.
    pub unrealised_pct: f64,
    /// Percentage of bars with a non-flat stance.
    pub time_in_market_pct: f64,
}

impl Summary {
    /// Key/value view for reporting surfaces.
    pub fn pairs(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Strategy%", self.strategy_pct),
            ("Market%", self.market_pct),
            ("Strategy_pa%", self.strategy_pa_pct),
            ("Market_pa%", self.market_pa_pct),
            ("Sharpe", self.sharpe),
            ("Market_Sharpe", self.market_sharpe),
            ("Trades", self.trades as f64),
            ("Trades_per_month", self.trades_per_month),
            ("Years", self.years),
            ("Current_stance", self.current_stance),
            ("Unrealised%", self.unrealised_pct),
            ("Time_in_market%", self.time_in_market_pct),
        ]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.pairs() {
            writeln!(f, "{key:<18} {value:>10.2}")?;
        }
        Ok(())
    }
}

/// Summarize a return series. Fails with `InsufficientHistory` when the
/// series spans less than one day (annualization undefined).
pub fn summarize(series: &ReturnSeries) -> Result<Summary, StancetraderError> {
    let n = series.len();
    if n == 0 {
        return Err(StancetraderError::EmptyInput);
    }
    let span_days = (series.dates[n - 1] - series.dates[0]).num_days();
    if span_days < 1 {
        return Err(StancetraderError::InsufficientHistory { days: span_days });
    }
    let years = span_days as f64 / DAYS_PER_YEAR;

    // Annualization from the actual sampling interval, not a constant:
    // supports daily and intraday calendars alike.
    let bar_interval_days = span_days as f64 / (n - 1) as f64;
    let periods_per_year = DAYS_PER_YEAR / bar_interval_days;

    let strategy_pct = total_pct(&series.strategy);
    let market_pct = total_pct(&series.market);

    let trades = series.trade_size.iter().filter(|&&s| s > 0.0).count();
    let flat = series.stance.iter().filter(|&&s| s == 0.0).count();

    let current_stance = series.current_stance();
    let final_price = series.last[n - 1];
    let unrealised_pct = if current_stance > 0.0 {
        series
            .last_buy()
            .map(|entry| (final_price / entry - 1.0) * 100.0)
            .unwrap_or(0.0)
    } else if current_stance < 0.0 {
        series
            .last_sell()
            .map(|entry| (entry / final_price - 1.0) * 100.0)
            .unwrap_or(0.0)
    } else {
        0.0
    };

    Ok(Summary {
        strategy_pct: round2(strategy_pct),
        market_pct: round2(market_pct),
        strategy_pa_pct: round2(annualize(strategy_pct, years)),
        market_pa_pct: round2(annualize(market_pct, years)),
        sharpe: round2(sharpe(&series.strategy, periods_per_year)),
        market_sharpe: round2(sharpe(&series.market, periods_per_year)),
        trades,
        trades_per_month: round2(trades as f64 / years / 12.0),
        years: round2(years),
        current_stance,
        unrealised_pct: round2(unrealised_pct),
        time_in_market_pct: round2((1.0 - flat as f64 / n as f64) * 100.0),
    })
}

fn total_pct(log_returns: &[f64]) -> f64 {
    (log_returns.iter().sum::<f64>().exp() - 1.0) * 100.0
}

fn annualize(pct: f64, years: f64) -> f64 {
    ((pct / 100.0 + 1.0).powf(1.0 / years) - 1.0) * 100.0
}

/// `sqrt(periods_per_year) * mean / stdev` (population stdev). NaN when the
/// return stream has zero variance or is empty.
fn sharpe(log_returns: &[f64], periods_per_year: f64) -> f64 {
    if log_returns.is_empty() {
        return f64::NAN;
    }
    let n = log_returns.len() as f64;
    let mean = log_returns.iter().sum::<f64>() / n;
    let variance = log_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();
    if stdev == 0.0 {
        return f64::NAN;
    }
    periods_per_year.sqrt() * mean / stdev
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

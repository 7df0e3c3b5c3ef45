//! Backtest façade: one price series, one stance provider, cached results.
//!
//! Derived series are computed on first access and cached (the computation
//! is pure and deterministic, so a failure would fail identically on
//! retry — nothing is retried). Replacing the price series or the provider
//! invalidates every cache; nothing recomputes in the background.

use crate::domain::drawdown::{self, DrawdownRecord, Target};
use crate::domain::error::StancetraderError;
use crate::domain::returns::{self, ReturnSeries};
use crate::domain::series::PriceSeries;
use crate::domain::strategy::StanceProvider;
use crate::domain::summary::{self, Summary};
use crate::domain::trades::{self, TradeRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Per-unit transaction cost charged after each stance change.
    pub slippage: f64,
    /// Skip short-side trade extraction.
    pub long_only: bool,
    /// Recursion budget for the drawdown search.
    pub dd_depth: usize,
    /// Only report drawdowns at least this deep, percent.
    pub dd_cutoff_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            slippage: 0.0,
            long_only: false,
            dd_depth: drawdown::DEFAULT_DEPTH,
            dd_cutoff_pct: 0.0,
        }
    }
}

pub struct Backtest {
    prices: PriceSeries,
    provider: Box<dyn StanceProvider>,
    config: BacktestConfig,
    returns: Option<ReturnSeries>,
    trades: Option<Vec<TradeRecord>>,
    summary: Option<Summary>,
}

impl Backtest {
    pub fn new(prices: PriceSeries, provider: Box<dyn StanceProvider>, config: BacktestConfig) -> Self {
        Backtest {
            prices,
            provider,
            config,
            returns: None,
            trades: None,
            summary: None,
        }
    }

    pub fn strategy_name(&self) -> String {
        self.provider.name()
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Replace the input data; all cached results are dropped.
    pub fn set_prices(&mut self, prices: PriceSeries) {
        self.prices = prices;
        self.invalidate();
    }

    /// Replace the stance provider; all cached results are dropped.
    pub fn set_provider(&mut self, provider: Box<dyn StanceProvider>) {
        self.provider = provider;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.returns = None;
        self.trades = None;
        self.summary = None;
    }

    /// Run the return engine (memoized).
    pub fn returns(&mut self) -> Result<&ReturnSeries, StancetraderError> {
        let series = match self.returns.take() {
            Some(series) => series,
            None => {
                let stance = self.provider.stances(&self.prices);
                returns::run(&self.prices, &stance, self.config.slippage)?
            }
        };
        Ok(self.returns.insert(series))
    }

    /// Trade records (memoized).
    pub fn trades(&mut self) -> Result<&[TradeRecord], StancetraderError> {
        if self.trades.is_none() {
            let long_only = self.config.long_only;
            let records = trades::extract(self.returns()?, long_only);
            self.trades = Some(records);
        }
        Ok(self.trades.as_deref().unwrap_or_default())
    }

    /// Performance summary (memoized).
    pub fn summary(&mut self) -> Result<&Summary, StancetraderError> {
        let summary = match self.summary.take() {
            Some(summary) => summary,
            None => summary::summarize(self.returns()?)?,
        };
        Ok(self.summary.insert(summary))
    }

    /// Drawdown table for the chosen curve. Cheap relative to the engine
    /// run, so not cached: depth/cutoff come from the config each call.
    pub fn drawdowns(&mut self, target: Target) -> Result<Vec<DrawdownRecord>, StancetraderError> {
        let depth = self.config.dd_depth;
        let cutoff = self.config.dd_cutoff_pct;
        Ok(drawdown::analyze(self.returns()?, target, depth, cutoff))
    }
}

//! Date-indexed price series.
//!
//! A [`PriceSeries`] is the immutable leaf input to the engine: last-trade
//! prices by date, ascending and unique, with optional high/low/volume.
//! Rows with non-finite or non-positive prices are dropped at construction
//! (log returns need a positive domain); duplicate dates are rejected.

use chrono::NaiveDate;

use crate::domain::error::StancetraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub last: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<i64>,
}

impl PriceBar {
    pub fn close(date: NaiveDate, last: f64) -> Self {
        PriceBar {
            date,
            last,
            high: None,
            low: None,
            volume: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from raw bars: sort by date, drop unusable prices,
    /// reject duplicate dates, reject an empty result.
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self, StancetraderError> {
        bars.retain(|b| b.last.is_finite() && b.last > 0.0);
        if bars.is_empty() {
            return Err(StancetraderError::EmptyInput);
        }
        bars.sort_by_key(|b| b.date);
        for pair in bars.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(StancetraderError::DuplicateDate { date: pair[1].date });
            }
        }
        Ok(PriceSeries { bars })
    }

    /// Convenience constructor from parallel date/price slices.
    pub fn from_closes(dates: &[NaiveDate], closes: &[f64]) -> Result<Self, StancetraderError> {
        let bars = dates
            .iter()
            .zip(closes)
            .map(|(&date, &last)| PriceBar::close(date, last))
            .collect();
        PriceSeries::new(bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.last).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Restrict to bars within `[start, end]` (inclusive, either side open).
    pub fn slice(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, StancetraderError> {
        let bars: Vec<PriceBar> = self
            .bars
            .iter()
            .filter(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e))
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(StancetraderError::EmptyInput);
        }
        Ok(PriceSeries { bars })
    }
}

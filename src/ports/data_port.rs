//! Data access port trait.

use crate::domain::error::StancetraderError;
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Load the price series, restricted to `[start, end]` where given.
    fn fetch_prices(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, StancetraderError>;

    /// First date, last date and bar count of the available data.
    fn data_range(&self) -> Result<(NaiveDate, NaiveDate, usize), StancetraderError>;
}

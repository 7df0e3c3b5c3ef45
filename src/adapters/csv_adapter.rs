//! CSV file data adapter.
//!
//! Expects `date,last[,high,low,volume]` columns by position with a header
//! row. Dates are `YYYY-MM-DD`. The optional columns may be blank per row.

use crate::domain::error::StancetraderError;
use crate::domain::series::{PriceBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_bars(&self) -> Result<Vec<PriceBar>, StancetraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| StancetraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StancetraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| StancetraderError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                StancetraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let last: f64 = record
                .get(1)
                .ok_or_else(|| StancetraderError::Data {
                    reason: "missing last column".into(),
                })?
                .parse()
                .map_err(|e| StancetraderError::Data {
                    reason: format!("invalid last value: {}", e),
                })?;

            bars.push(PriceBar {
                date,
                last,
                high: optional_field(&record, 2, "high")?,
                low: optional_field(&record, 3, "low")?,
                volume: optional_field(&record, 4, "volume")?,
            });
        }

        Ok(bars)
    }
}

/// Parse column `index` when present and non-empty; a malformed value is
/// still an error (a blank cell is the only way to say "no data").
fn optional_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<Option<T>, StancetraderError>
where
    T::Err: std::fmt::Display,
{
    match record.get(index) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| StancetraderError::Data {
                reason: format!("invalid {} value: {}", name, e),
            }),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, StancetraderError> {
        let bars = self.read_bars()?;
        PriceSeries::new(bars)?.slice(start, end)
    }

    fn data_range(&self) -> Result<(NaiveDate, NaiveDate, usize), StancetraderError> {
        let series = self.fetch_prices(None, None)?;
        Ok((series.first_date(), series.last_date(), series.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    const FULL: &str = "date,last,high,low,volume\n\
        2024-01-15,105.0,110.0,90.0,50000\n\
        2024-01-16,110.0,115.0,100.0,60000\n\
        2024-01-17,115.0,120.0,105.0,55000\n";

    #[test]
    fn fetch_prices_returns_correct_data() {
        let (_dir, path) = setup_test_data(FULL);
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_prices(None, None).unwrap();
        assert_eq!(series.len(), 3);

        let bar = &series.bars()[0];
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bar.last, 105.0);
        assert_eq!(bar.high, Some(110.0));
        assert_eq!(bar.low, Some(90.0));
        assert_eq!(bar.volume, Some(50000));
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let (_dir, path) = setup_test_data(FULL);
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let series = adapter.fetch_prices(Some(day), Some(day)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), day);
    }

    #[test]
    fn two_column_file_accepted() {
        let (_dir, path) = setup_test_data("date,last\n2024-01-15,105.0\n2024-01-16,110.0\n");
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_prices(None, None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].high, None);
        assert_eq!(series.bars()[0].volume, None);
    }

    #[test]
    fn blank_optional_cells_accepted() {
        let (_dir, path) =
            setup_test_data("date,last,high,low,volume\n2024-01-15,105.0,,,\n2024-01-16,110.0,115.0,,\n");
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_prices(None, None).unwrap();
        assert_eq!(series.bars()[0].high, None);
        assert_eq!(series.bars()[1].high, Some(115.0));
    }

    #[test]
    fn malformed_price_is_error() {
        let (_dir, path) = setup_test_data("date,last\n2024-01-15,abc\n");
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_prices(None, None).unwrap_err();
        assert!(matches!(err, StancetraderError::Data { .. }));
    }

    #[test]
    fn malformed_date_is_error() {
        let (_dir, path) = setup_test_data("date,last\n15/01/2024,105.0\n");
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_prices(None, None).unwrap_err();
        assert!(matches!(err, StancetraderError::Data { .. }));
    }

    #[test]
    fn missing_file_is_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/prices.csv"));
        let err = adapter.fetch_prices(None, None).unwrap_err();
        assert!(matches!(err, StancetraderError::Data { .. }));
    }

    #[test]
    fn data_range_reports_bounds() {
        let (_dir, path) = setup_test_data(FULL);
        let adapter = CsvAdapter::new(path);

        let (first, last, count) = adapter.data_range().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_eq!(count, 3);
    }
}

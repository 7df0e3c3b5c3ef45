#![allow(dead_code)]

use chrono::NaiveDate;
use stancetrader::domain::returns::{self, ReturnSeries};
use stancetrader::domain::series::PriceSeries;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily price series starting 2024-01-01.
pub fn daily_prices(closes: &[f64]) -> PriceSeries {
    let dates: Vec<NaiveDate> = (0..closes.len())
        .map(|i| date(2024, 1, 1) + chrono::Duration::days(i as i64))
        .collect();
    PriceSeries::from_closes(&dates, closes).unwrap()
}

pub fn run_engine(closes: &[f64], stance: &[f64], slippage: f64) -> ReturnSeries {
    returns::run(&daily_prices(closes), stance, slippage).unwrap()
}

/// Deterministic pseudo-random walk (LCG), strictly positive prices.
pub fn random_walk(seed: u64, n: usize) -> Vec<f64> {
    let mut state = seed;
    let mut level = 100.0_f64;
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let step = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
        level *= 1.0 + step * 0.04;
        values.push(level);
    }
    values
}

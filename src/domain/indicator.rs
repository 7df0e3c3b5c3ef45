//! Moving averages for the bundled stance providers.
//!
//! SMA: plain rolling mean, first (n-1) values unavailable.
//! EMA: k = 2/(n+1), seeded with the first SMA, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Same warmup as SMA.
//!
//! Anything fancier than these two belongs to an external collaborator.

/// Simple moving average. `None` during warmup.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Exponential moving average seeded with the first SMA. `None` during warmup.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut seed_sum = 0.0;
    let mut prev = 0.0;
    for (i, &v) in values.iter().enumerate() {
        if i + 1 < period {
            seed_sum += v;
            out.push(None);
        } else if i + 1 == period {
            seed_sum += v;
            prev = seed_sum / period as f64;
            out.push(Some(prev));
        } else {
            prev = v * k + prev * (1.0 - k);
            out.push(Some(prev));
        }
    }
    out
}

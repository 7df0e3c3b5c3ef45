//! Stance providers: the pluggable seam between indicator logic and the
//! return engine.
//!
//! The engine never cares how a stance was derived; anything that can turn
//! price history into a synchronized stance sequence plugs in here. The
//! bundled providers are deliberately small: an MA crossover, a
//! higher-price lookback, and an MA crossover with stop losses driven by
//! the [`PositionState`] machine. Stances use only information available up
//! to and including the bar they are attached to; the engine applies the
//! one-bar execution lag.

use crate::domain::error::StancetraderError;
use crate::domain::indicator::{ema, sma};
use crate::domain::series::PriceSeries;
use crate::domain::stance::{PositionState, Signal, FLAT, LONG, SHORT};

pub trait StanceProvider: std::fmt::Debug {
    fn name(&self) -> String;

    /// Produce one stance value per bar of `prices`.
    fn stances(&self, prices: &PriceSeries) -> Vec<f64>;
}

/// A pre-computed stance sequence, for tests and for callers that derive
/// stances elsewhere.
#[derive(Debug, Clone)]
pub struct ScriptedStance(pub Vec<f64>);

impl StanceProvider for ScriptedStance {
    fn name(&self) -> String {
        "scripted".into()
    }

    fn stances(&self, _prices: &PriceSeries) -> Vec<f64> {
        self.0.clone()
    }
}

/// Long when the short MA is at or above the long MA, short (or flat when
/// long-only) otherwise. Flat during warmup.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short: usize,
    pub long: usize,
    pub ema: bool,
    pub long_only: bool,
}

impl MaCrossover {
    fn averages(&self, closes: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        if self.ema {
            (ema(closes, self.short), ema(closes, self.long))
        } else {
            (sma(closes, self.short), sma(closes, self.long))
        }
    }
}

impl StanceProvider for MaCrossover {
    fn name(&self) -> String {
        format!(
            "ma(short={}, long={}, ema={}, long_only={})",
            self.short, self.long, self.ema, self.long_only
        )
    }

    fn stances(&self, prices: &PriceSeries) -> Vec<f64> {
        let closes = prices.closes();
        let (ms, ml) = self.averages(&closes);
        ms.iter()
            .zip(&ml)
            .map(|(s, l)| match (s, l) {
                (Some(s), Some(l)) if s >= l => LONG,
                (Some(_), Some(_)) if self.long_only => FLAT,
                (Some(_), Some(_)) => SHORT,
                _ => FLAT,
            })
            .collect()
    }
}

/// Long when the price is at or above its level `lookback` bars ago.
#[derive(Debug, Clone)]
pub struct HigherPrice {
    pub lookback: usize,
    pub long_only: bool,
}

impl StanceProvider for HigherPrice {
    fn name(&self) -> String {
        format!(
            "higher(lookback={}, long_only={})",
            self.lookback, self.long_only
        )
    }

    fn stances(&self, prices: &PriceSeries) -> Vec<f64> {
        let closes = prices.closes();
        (0..closes.len())
            .map(|t| {
                if t < self.lookback {
                    FLAT
                } else if closes[t] >= closes[t - self.lookback] {
                    LONG
                } else if self.long_only {
                    FLAT
                } else {
                    SHORT
                }
            })
            .collect()
    }
}

/// MA crossover with a stop loss, run through the position state machine.
///
/// Stops trigger on the close (intrabar high/low fills are not modeled) and
/// the trailing stop ratchets off the close as well. A stopped-out side
/// stays flat until the opposite crossover signal fires.
#[derive(Debug, Clone)]
pub struct MaStopLoss {
    pub short: usize,
    pub long: usize,
    pub ema: bool,
    /// Fractional stop distance from entry, e.g. 0.05 for 5%.
    pub stop_loss: f64,
    pub trailing: bool,
    pub long_only: bool,
}

impl StanceProvider for MaStopLoss {
    fn name(&self) -> String {
        format!(
            "mastop(short={}, long={}, ema={}, stop={}, trailing={}, long_only={})",
            self.short, self.long, self.ema, self.stop_loss, self.trailing, self.long_only
        )
    }

    fn stances(&self, prices: &PriceSeries) -> Vec<f64> {
        let closes = prices.closes();
        let crossover = MaCrossover {
            short: self.short,
            long: self.long,
            ema: self.ema,
            long_only: false,
        };
        let (ms, ml) = crossover.averages(&closes);

        let mut state = PositionState::Flat;
        let mut entry = 0.0_f64;
        let mut stop = 0.0_f64;
        let mut stances = Vec::with_capacity(closes.len());

        for t in 0..closes.len() {
            let close = closes[t];

            // Stop check before the crossover signal, so a stopped position
            // can still act on this bar's signal.
            match state {
                PositionState::Long => {
                    // Ratchet only upward.
                    if self.trailing && close - self.stop_loss * entry > stop {
                        stop = close - self.stop_loss * entry;
                    }
                    if close <= stop {
                        state = state.step(Signal::StopLong, self.long_only);
                    }
                }
                PositionState::Short => {
                    // Ratchet only downward.
                    if self.trailing && close + self.stop_loss * entry < stop {
                        stop = close + self.stop_loss * entry;
                    }
                    if close >= stop {
                        state = state.step(Signal::StopShort, self.long_only);
                    }
                }
                _ => {}
            }

            let signal = match (ms[t], ml[t]) {
                (Some(s), Some(l)) if s >= l => Signal::Buy,
                (Some(_), Some(_)) => Signal::Sell,
                _ => Signal::None,
            };

            let next = state.step(signal, self.long_only);
            if next != state && matches!(next, PositionState::Long | PositionState::Short) {
                entry = close;
                stop = match next {
                    PositionState::Long => entry * (1.0 - self.stop_loss),
                    _ => entry * (1.0 + self.stop_loss),
                };
            }
            state = next;

            stances.push(state.stance());
        }
        stances
    }
}

/// Parse a compact strategy spec string, e.g. `ma:5,20`, `ma:5,20:ema`,
/// `higher:7:long-only`, `mastop:1,10,0.05:trailing`.
pub fn parse_spec(spec: &str) -> Result<Box<dyn StanceProvider>, StancetraderError> {
    let invalid = |reason: &str| StancetraderError::StrategySpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = spec.split(':');
    let kind = segments.next().unwrap_or_default().trim();
    let rest: Vec<&str> = segments.map(str::trim).collect();

    let flags: Vec<&str> = rest.iter().skip(1).copied().collect();
    let flag = |name: &str| flags.contains(&name);
    for f in &flags {
        if !matches!(*f, "ema" | "long-only" | "trailing") {
            return Err(invalid(&format!("unknown flag '{f}'")));
        }
    }

    let params: Vec<&str> = rest
        .first()
        .map(|p| p.split(',').map(str::trim).collect())
        .unwrap_or_default();

    match kind {
        "ma" => {
            if params.len() != 2 {
                return Err(invalid("expected ma:<short>,<long>"));
            }
            let short: usize = params[0].parse().map_err(|_| invalid("bad short period"))?;
            let long: usize = params[1].parse().map_err(|_| invalid("bad long period"))?;
            if short == 0 || long <= short {
                return Err(invalid("need 0 < short < long"));
            }
            Ok(Box::new(MaCrossover {
                short,
                long,
                ema: flag("ema"),
                long_only: flag("long-only"),
            }))
        }
        "higher" => {
            if params.len() != 1 {
                return Err(invalid("expected higher:<lookback>"));
            }
            let lookback: usize = params[0].parse().map_err(|_| invalid("bad lookback"))?;
            if lookback == 0 {
                return Err(invalid("lookback must be positive"));
            }
            Ok(Box::new(HigherPrice {
                lookback,
                long_only: flag("long-only"),
            }))
        }
        "mastop" => {
            if params.len() != 3 {
                return Err(invalid("expected mastop:<short>,<long>,<stop>"));
            }
            let short: usize = params[0].parse().map_err(|_| invalid("bad short period"))?;
            let long: usize = params[1].parse().map_err(|_| invalid("bad long period"))?;
            let stop_loss: f64 = params[2].parse().map_err(|_| invalid("bad stop loss"))?;
            if short == 0 || long <= short {
                return Err(invalid("need 0 < short < long"));
            }
            if !(stop_loss > 0.0 && stop_loss < 1.0) {
                return Err(invalid("stop loss must be in (0, 1)"));
            }
            Ok(Box::new(MaStopLoss {
                short,
                long,
                ema: flag("ema"),
                stop_loss,
                trailing: flag("trailing"),
                long_only: flag("long-only"),
            }))
        }
        _ => Err(invalid("unknown strategy kind")),
    }
}

//! Stance values and the position state machine.
//!
//! A stance is the directional position held over a bar: 1 long, -1 short,
//! 0 flat. Portfolio aggregation produces continuous weights in [-1, 1];
//! [`sign`] collapses them back to the discrete set.
//!
//! Stop-loss strategies carry per-bar position state. Instead of nested
//! conditionals this is an explicit finite-state machine: [`PositionState`]
//! with a declared transition table in [`PositionState::step`]. The waiting
//! states model the rule that a stopped-out side may not re-enter until the
//! opposite signal has fired.

use std::fmt;

pub const LONG: f64 = 1.0;
pub const FLAT: f64 = 0.0;
pub const SHORT: f64 = -1.0;

/// Collapse a continuous stance weight to {-1, 0, 1}.
pub fn sign(weight: f64) -> f64 {
    if weight > 0.0 {
        LONG
    } else if weight < 0.0 {
        SHORT
    } else {
        FLAT
    }
}

/// Trade side, used for trade records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

/// Per-bar signal fed to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    /// Stop level breached while long.
    StopLong,
    /// Stop level breached while short.
    StopShort,
    None,
}

/// Position state for stop-loss strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
    Short,
    /// Stopped out of a short; flat until the next buy signal.
    WaitingForLong,
    /// Stopped out of a long; flat until the next sell signal.
    WaitingForShort,
}

impl PositionState {
    /// Transition table. `long_only` maps every would-be short to flat.
    pub fn step(self, signal: Signal, long_only: bool) -> PositionState {
        use PositionState::*;
        match (self, signal) {
            (Flat, Signal::Buy) => Long,
            (Flat, Signal::Sell) => {
                if long_only {
                    Flat
                } else {
                    Short
                }
            }
            (Long, Signal::Sell) => {
                if long_only {
                    Flat
                } else {
                    Short
                }
            }
            (Long, Signal::StopLong) => WaitingForShort,
            (Short, Signal::Buy) => Long,
            (Short, Signal::StopShort) => WaitingForLong,
            (WaitingForLong, Signal::Buy) => Long,
            (WaitingForShort, Signal::Sell) => {
                if long_only {
                    Flat
                } else {
                    Short
                }
            }
            (state, _) => state,
        }
    }

    /// The stance value this state contributes for the bar.
    pub fn stance(self) -> f64 {
        match self {
            PositionState::Long => LONG,
            PositionState::Short => SHORT,
            PositionState::Flat
            | PositionState::WaitingForLong
            | PositionState::WaitingForShort => FLAT,
        }
    }
}

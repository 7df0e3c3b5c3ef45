//! Core domain types and logic.

pub mod series;
pub mod stance;
pub mod indicator;
pub mod strategy;
pub mod returns;
pub mod trades;
pub mod summary;
pub mod drawdown;
pub mod portfolio;
pub mod backtest;
pub mod config_validation;
pub mod error;

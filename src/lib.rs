//! aatr: fixed-threshold hold-rule backtester over daily price history.
//!
//! Every eligible day of a symbol's history is treated as a buy at the
//! close, held until a gain target or loss floor is crossed after a minimum
//! hold. Outcomes are tallied per symbol and bucketed into fixed-size
//! periods of win rates.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;

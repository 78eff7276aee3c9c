//! Core domain types and logic.

pub mod price;
pub mod simulator;
pub mod analysis;
pub mod batch;
pub mod universe;
pub mod config_validation;
pub mod error;

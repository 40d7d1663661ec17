//! Infrastructure layer: ledger storage backends, configuration, reporting.

pub mod config;
pub mod reporting;
pub mod seed;
pub mod store;

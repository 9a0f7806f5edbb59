//! Baseline data model, persistence, configuration and errors.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

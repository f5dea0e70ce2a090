//! Common types and utilities for akasim
//!
//! This crate provides the shared error type, logging bootstrap,
//! subscriber identity types, and YAML configuration used across the
//! akasim crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{OpType, SubscriberConfig};
pub use error::Error;
pub use logging::{init_logging, HexDump, LogLevel};
pub use types::{Imsi, Plmn};

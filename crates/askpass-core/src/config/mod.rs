//! The JSON5 configuration file: schema, loading and validation.
//!
//! A missing file is not an error; every field has a default.

mod loader;
mod schema;

pub use schema::{Config, KeychainConfig, LogLevel, LoggingConfig};

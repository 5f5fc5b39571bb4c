//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and defaults
//! - [`validation`]: Startup checks that report every problem at once

mod types;
mod validation;

pub use types::{Config, ConfigError, LimitsConfig, LogConfig, ServerConfig};
pub use validation::{ValidationError, validate};

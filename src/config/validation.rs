//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early. Queue
//! capacities of zero would make the runtime panic when the channels are
//! created, so they are rejected here.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("limits.{0} must be greater than zero")]
    ZeroCapacity(&'static str),
    #[error("limits.max_line_length must be greater than zero")]
    ZeroLineLength,
    #[error("log.file must not be empty when set")]
    EmptyLogFile,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let limits = &config.limits;
    for (name, value) in [
        ("client_queue", limits.client_queue),
        ("entering_queue", limits.entering_queue),
        ("leaving_queue", limits.leaving_queue),
        ("message_queue", limits.message_queue),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroCapacity(name));
        }
    }
    if limits.max_line_length == 0 {
        errors.push(ValidationError::ZeroLineLength);
    }

    if let Some(ref file) = config.log.file
        && file.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptyLogFile);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, worker bounds)
//! - Reject account names that the account tooling would misinterpret
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Configuration → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the store

use std::str::FromStr;

use thiserror::Error;
use tracing::Level;

use crate::config::schema::Configuration;

/// Longest account name accepted by the shadow utilities.
pub const MAX_USERNAME_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("api.port must be non-zero")]
    ZeroApiPort,

    #[error("api.ssl is enabled but cert or key is missing")]
    IncompleteSsl,

    #[error("system.data must not be empty")]
    EmptyDataDirectory,

    #[error("system.username {0:?} is not a valid account name")]
    InvalidUsername(String),

    #[error("system.permission_workers must be at least 1")]
    ZeroPermissionWorkers,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &Configuration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.api.port == 0 {
        errors.push(ValidationError::ZeroApiPort);
    }
    let ssl = &config.api.ssl;
    if ssl.enabled && (ssl.certificate_file.is_empty() || ssl.key_file.is_empty()) {
        errors.push(ValidationError::IncompleteSsl);
    }
    if config.system.data.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyDataDirectory);
    }
    if !is_valid_username(&config.system.username) {
        errors.push(ValidationError::InvalidUsername(config.system.username.clone()));
    }
    if config.system.permission_workers == 0 {
        errors.push(ValidationError::ZeroPermissionWorkers);
    }
    if Level::from_str(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `[a-z_][a-z0-9_-]*[$]?`, at most [`MAX_USERNAME_LENGTH`] bytes.
pub fn is_valid_username(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_USERNAME_LENGTH {
        return false;
    }
    let body = name.strip_suffix('$').unwrap_or(name);
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

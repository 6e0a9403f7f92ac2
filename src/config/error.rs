//! Error type shared by the configuration subsystem.

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Errors raised while loading, publishing, or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The store was read before the first snapshot was published.
    #[error("configuration has not been initialized")]
    NotInitialized,

    /// Persistence was requested but no destination path is known.
    #[error("cannot write configuration: no path configured")]
    PathNotConfigured,

    /// Reading or writing the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded as a document.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// The document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// The document parsed but failed semantic checks.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid static configuration.
/// Display-configuration entries never produce one: a malformed entry just fails to match.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unknown page layout section: {0}")]
    UnknownSection(String),

    #[error("invalid page layout at '{path}': {message}")]
    InvalidLayout { path: String, message: String },

    #[error("invalid risk label pattern: {0}")]
    InvalidRiskLabel(String),
}

//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::FetchError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Missing configuration or a requester who does not own it. Carries no case data.
    #[error("access denied to display configuration {config_id}")]
    Access { config_id: String },

    #[error("fetch failed: {context}")]
    Upstream {
        context: String,
        #[source]
        source: FetchError,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

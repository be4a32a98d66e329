//! Error conversion helpers for collaborator calls
//!
//! Provides extension traits for cleaner error handling with fetch context.

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::FetchResult;

/// Extension trait for converting `FetchResult` to `ApplicationResult` with context.
pub trait FetchResultExt<T> {
    /// Add context to a collaborator failure.
    ///
    /// # Example
    /// ```ignore
    /// facts.visit(case_id).with_fetch_context("visit", case_id)?;
    /// ```
    fn with_fetch_context(self, what: &str, id: impl std::fmt::Display) -> ApplicationResult<T>;
}

impl<T> FetchResultExt<T> for FetchResult<T> {
    fn with_fetch_context(self, what: &str, id: impl std::fmt::Display) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Upstream {
            context: format!("{what} {id}"),
            source,
        })
    }
}

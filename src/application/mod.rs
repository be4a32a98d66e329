//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on the collaborator traits.

pub mod error;
pub mod error_ext;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::FetchResultExt;

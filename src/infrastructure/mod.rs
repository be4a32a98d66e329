//! Infrastructure layer: fact stores, I/O implementations and DI container
//!
//! This layer implements the collaborator traits and wires up services.

pub mod di;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use memory::MemoryStore;
pub use snapshot::load_snapshot;
pub use traits::{ClinicalFactSource, ConceptNameResolver, DisplayConfigStore, FetchError};

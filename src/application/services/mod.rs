//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on collaborator traits (ClinicalFactSource, DisplayConfigStore, ...)
//! but are themselves concrete structs, not traits.

mod case_tree;
mod review;
mod risk;

pub use case_tree::{CaseTree, CaseTreeBuilder};
pub use review::CaseReviewService;
pub use risk::RiskScoreResolver;

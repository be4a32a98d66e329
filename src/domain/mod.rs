//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod display;
pub mod entities;
pub mod error;
pub mod layout;
pub mod risk;
pub mod tree;

pub use display::{
    rank_important_infos, DisplayConfigApplier, DisplayConfigEntry, DisplayPath, EntryStyle,
    ImportantInfo,
};
pub use entities::*;
pub use error::DomainError;
pub use layout::{LayoutEntry, LayoutNode, PageLayout, SectionKind};
pub use risk::{RiskRules, RiskSettings};
pub use tree::{reduce_rows, NodeStyle, NodeValue, TreeNode};

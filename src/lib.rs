//! Case review engine.
//!
//! Builds the fact tree of a de-identified clinical case from a page layout,
//! prunes and styles it with a reviewer's display configuration, and ranks the
//! important facts together with a colorectal-cancer risk score.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

//! I/O boundary traits for testability
//!
//! The review core only talks to these traits: a vocabulary lookup, a clinical
//! fact source and a display-configuration store. Any backing store (a database
//! client, the JSON snapshot, the in-memory test store) plugs in behind them.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::domain::{
    CaseId, ConceptId, DisplayConfig, DrugExposure, Measurement, Observation, Person, Visit,
};

/// Failure reported by a collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },

    #[error("fact source unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Vocabulary lookup.
pub trait ConceptNameResolver: Send + Sync {
    /// Display name of a concept.
    fn concept_name(&self, concept_id: ConceptId) -> FetchResult<String>;
}

/// Clinical facts of one case.
///
/// Row order is whatever the source returns; the tree keeps it.
pub trait ClinicalFactSource: Send + Sync {
    /// Observations whose observation type is one of `type_concept_ids`.
    fn observations_by_type(
        &self,
        case_id: CaseId,
        type_concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Observation>>;

    fn observations_by_concept(
        &self,
        case_id: CaseId,
        concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Observation>>;

    fn measurements(
        &self,
        case_id: CaseId,
        concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Measurement>>;

    /// Measurements whose concept is reached from one of `parent_concept_ids`
    /// through a "Subsumes" or "Is characterized by" relationship.
    fn measurements_of_parents(
        &self,
        case_id: CaseId,
        parent_concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Measurement>>;

    fn drug_exposures(&self, case_id: CaseId) -> FetchResult<Vec<DrugExposure>>;

    fn visit(&self, case_id: CaseId) -> FetchResult<Visit>;

    fn person(&self, person_id: i64) -> FetchResult<Person>;
}

/// Persisted display configurations.
pub trait DisplayConfigStore: Send + Sync {
    /// `None` when no configuration carries `config_id`.
    fn display_config_by_id(&self, config_id: &str) -> FetchResult<Option<DisplayConfig>>;

    fn display_configs_by_owner(&self, owner_user_id: &str) -> FetchResult<Vec<DisplayConfig>>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

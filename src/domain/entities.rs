//! Domain entities: fact rows, display configurations and review responses

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::display::DisplayConfigEntry;
use crate::domain::tree::TreeNode;

/// Numeric vocabulary code; its label is resolved externally.
pub type ConceptId = i64;

/// Identifier of one patient visit under review.
pub type CaseId = i64;

/// Concept id the vocabulary uses for "no matching concept".
pub const NO_MATCHING_CONCEPT: ConceptId = 0;

/// Treat the "no matching concept" sentinel like a missing reference.
pub fn concept_ref(id: Option<ConceptId>) -> Option<ConceptId> {
    id.filter(|&c| c != NO_MATCHING_CONCEPT)
}

/// Free-form observation row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub concept_id: ConceptId,
    pub value_as_string: Option<String>,
    pub value_as_number: Option<f64>,
    pub value_as_concept_id: Option<ConceptId>,
    pub unit_concept_id: Option<ConceptId>,
    pub unit_source_value: Option<String>,
    pub qualifier_concept_id: Option<ConceptId>,
}

impl Observation {
    /// Observation carrying a plain text value.
    pub fn text(concept_id: ConceptId, value: impl Into<String>) -> Self {
        Self {
            concept_id,
            value_as_string: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Quantitative measurement row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub concept_id: ConceptId,
    pub value_as_number: Option<f64>,
    pub value_as_concept_id: Option<ConceptId>,
    pub unit_concept_id: Option<ConceptId>,
    pub unit_source_value: Option<String>,
    pub operator_concept_id: Option<ConceptId>,
}

impl Measurement {
    pub fn number(concept_id: ConceptId, value: f64) -> Self {
        Self {
            concept_id,
            value_as_number: Some(value),
            ..Self::default()
        }
    }
}

/// Medication exposure row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugExposure {
    pub drug_concept_id: ConceptId,
    pub quantity: Option<f64>,
    pub days_supply: Option<i64>,
}

/// Visit the case is anchored on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub person_id: i64,
    pub visit_start_date: NaiveDate,
}

impl Visit {
    pub fn start_year(&self) -> i32 {
        self.visit_start_date.year()
    }
}

/// De-identified person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: i64,
    pub year_of_birth: i32,
    pub gender_concept_id: ConceptId,
    /// Display label shown to the reviewer instead of any identifier.
    pub person_label: String,
}

impl Person {
    /// Age at the given visit, in whole years.
    pub fn age_at(&self, visit: &Visit) -> i32 {
        visit.start_year() - self.year_of_birth
    }
}

/// Per-(user, case) display configuration as persisted by the ingestion step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub id: String,
    pub owner_user_id: String,
    pub case_id: CaseId,
    #[serde(default)]
    pub entries: Vec<DisplayConfigEntry>,
}

/// Final response handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReview {
    pub person_label: String,
    pub case_number: String,
    pub details: Vec<TreeNode>,
    pub important_infos: Vec<TreeNode>,
}

/// One row of a reviewer's case list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    pub config_id: String,
    pub case_id: CaseId,
    pub patient_chief_complaint: Option<String>,
    pub age: String,
    pub gender: String,
}

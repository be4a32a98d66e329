//! In-memory fact store.
//!
//! Backs the JSON snapshot used by the CLI and serves as the collaborator fake
//! in tests. Rows are kept in insertion order, which is the order every query
//! returns them in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{
    CaseId, ConceptId, DisplayConfig, DrugExposure, Measurement, Observation, Person, Visit,
};
use crate::infrastructure::traits::{
    ClinicalFactSource, ConceptNameResolver, DisplayConfigStore, FetchError, FetchResult,
};

/// Relationships followed from an exam category to its measurements.
pub const MEASUREMENT_RELATIONSHIPS: [&str; 2] = ["Subsumes", "Is characterized by"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub case_id: CaseId,
    #[serde(flatten)]
    pub visit: Visit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub case_id: CaseId,
    pub observation_type_concept_id: ConceptId,
    #[serde(flatten)]
    pub observation: Observation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub case_id: CaseId,
    #[serde(flatten)]
    pub measurement: Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugExposureRecord {
    pub case_id: CaseId,
    #[serde(flatten)]
    pub exposure: DrugExposure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRelationship {
    pub concept_id_1: ConceptId,
    pub concept_id_2: ConceptId,
    pub relationship_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStore {
    pub concepts: HashMap<ConceptId, String>,
    pub visits: Vec<VisitRecord>,
    pub persons: Vec<Person>,
    pub observations: Vec<ObservationRecord>,
    pub measurements: Vec<MeasurementRecord>,
    pub drug_exposures: Vec<DrugExposureRecord>,
    pub relationships: Vec<ConceptRelationship>,
    pub display_configs: Vec<DisplayConfig>,
    /// When set, every query fails with this error.
    #[serde(skip)]
    failure: Option<FetchError>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn with_concept(mut self, concept_id: ConceptId, name: impl Into<String>) -> Self {
        self.concepts.insert(concept_id, name.into());
        self
    }

    pub fn with_visit(mut self, case_id: CaseId, visit: Visit) -> Self {
        self.visits.push(VisitRecord { case_id, visit });
        self
    }

    pub fn with_person(mut self, person: Person) -> Self {
        self.persons.push(person);
        self
    }

    pub fn with_observation(
        mut self,
        case_id: CaseId,
        observation_type_concept_id: ConceptId,
        observation: Observation,
    ) -> Self {
        self.observations.push(ObservationRecord {
            case_id,
            observation_type_concept_id,
            observation,
        });
        self
    }

    pub fn with_measurement(mut self, case_id: CaseId, measurement: Measurement) -> Self {
        self.measurements.push(MeasurementRecord {
            case_id,
            measurement,
        });
        self
    }

    pub fn with_drug_exposure(mut self, case_id: CaseId, exposure: DrugExposure) -> Self {
        self.drug_exposures
            .push(DrugExposureRecord { case_id, exposure });
        self
    }

    pub fn with_relationship(
        mut self,
        parent: ConceptId,
        child: ConceptId,
        relationship_id: impl Into<String>,
    ) -> Self {
        self.relationships.push(ConceptRelationship {
            concept_id_1: parent,
            concept_id_2: child,
            relationship_id: relationship_id.into(),
        });
        self
    }

    pub fn with_display_config(mut self, config: DisplayConfig) -> Self {
        self.display_configs.push(config);
        self
    }

    /// Make every query fail as an unreachable source would.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(FetchError::Unavailable(message.into()));
        self
    }

    fn check(&self) -> FetchResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn children_of(&self, parents: &[ConceptId]) -> Vec<ConceptId> {
        self.relationships
            .iter()
            .filter(|r| {
                parents.contains(&r.concept_id_1)
                    && MEASUREMENT_RELATIONSHIPS.contains(&r.relationship_id.as_str())
            })
            .map(|r| r.concept_id_2)
            .collect()
    }
}

impl ConceptNameResolver for MemoryStore {
    fn concept_name(&self, concept_id: ConceptId) -> FetchResult<String> {
        self.check()?;
        self.concepts
            .get(&concept_id)
            .cloned()
            .ok_or_else(|| FetchError::not_found("concept", concept_id))
    }
}

impl ClinicalFactSource for MemoryStore {
    fn observations_by_type(
        &self,
        case_id: CaseId,
        type_concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Observation>> {
        self.check()?;
        Ok(self
            .observations
            .iter()
            .filter(|r| r.case_id == case_id && type_concept_ids.contains(&r.observation_type_concept_id))
            .map(|r| r.observation.clone())
            .collect())
    }

    fn observations_by_concept(
        &self,
        case_id: CaseId,
        concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Observation>> {
        self.check()?;
        Ok(self
            .observations
            .iter()
            .filter(|r| r.case_id == case_id && concept_ids.contains(&r.observation.concept_id))
            .map(|r| r.observation.clone())
            .collect())
    }

    fn measurements(
        &self,
        case_id: CaseId,
        concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Measurement>> {
        self.check()?;
        Ok(self
            .measurements
            .iter()
            .filter(|r| r.case_id == case_id && concept_ids.contains(&r.measurement.concept_id))
            .map(|r| r.measurement.clone())
            .collect())
    }

    fn measurements_of_parents(
        &self,
        case_id: CaseId,
        parent_concept_ids: &[ConceptId],
    ) -> FetchResult<Vec<Measurement>> {
        self.check()?;
        let children = self.children_of(parent_concept_ids);
        trace!("parents {:?} reach {} concepts", parent_concept_ids, children.len());
        self.measurements(case_id, &children)
    }

    fn drug_exposures(&self, case_id: CaseId) -> FetchResult<Vec<DrugExposure>> {
        self.check()?;
        Ok(self
            .drug_exposures
            .iter()
            .filter(|r| r.case_id == case_id)
            .map(|r| r.exposure.clone())
            .collect())
    }

    fn visit(&self, case_id: CaseId) -> FetchResult<Visit> {
        self.check()?;
        self.visits
            .iter()
            .find(|r| r.case_id == case_id)
            .map(|r| r.visit.clone())
            .ok_or_else(|| FetchError::not_found("visit", case_id))
    }

    fn person(&self, person_id: i64) -> FetchResult<Person> {
        self.check()?;
        self.persons
            .iter()
            .find(|p| p.person_id == person_id)
            .cloned()
            .ok_or_else(|| FetchError::not_found("person", person_id))
    }
}

impl DisplayConfigStore for MemoryStore {
    fn display_config_by_id(&self, config_id: &str) -> FetchResult<Option<DisplayConfig>> {
        self.check()?;
        Ok(self
            .display_configs
            .iter()
            .find(|c| c.id == config_id)
            .cloned())
    }

    fn display_configs_by_owner(&self, owner_user_id: &str) -> FetchResult<Vec<DisplayConfig>> {
        self.check()?;
        Ok(self
            .display_configs
            .iter()
            .filter(|c| c.owner_user_id == owner_user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_relationships_when_fetching_parent_measurements_then_follows_known_kinds_only() {
        let store = MemoryStore::new()
            .with_relationship(100, 1, "Subsumes")
            .with_relationship(100, 2, "Is characterized by")
            .with_relationship(100, 3, "Maps to")
            .with_measurement(7, Measurement::number(1, 72.0))
            .with_measurement(7, Measurement::number(2, 37.0))
            .with_measurement(7, Measurement::number(3, 1.0))
            .with_measurement(8, Measurement::number(1, 60.0));

        let rows = store.measurements_of_parents(7, &[100]).unwrap();

        let ids: Vec<_> = rows.iter().map(|m| m.concept_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn given_failing_store_when_querying_then_reports_unavailable() {
        let store = MemoryStore::new().with_concept(1, "x").failing("connection refused");
        assert!(matches!(
            store.concept_name(1),
            Err(FetchError::Unavailable(msg)) if msg == "connection refused"
        ));
    }

    #[test]
    fn given_json_rows_when_loading_then_flattens_case_wrappers() {
        let store = MemoryStore::from_json(
            r#"{
                "concepts": {"38000282": "Chief complaint"},
                "observations": [
                    {"case_id": 1, "observation_type_concept_id": 38000282,
                     "concept_id": 4, "value_as_string": "Abdominal pain"}
                ]
            }"#,
        )
        .unwrap();

        let rows = store.observations_by_type(1, &[38000282]).unwrap();
        assert_eq!(rows, vec![Observation::text(4, "Abdominal pain")]);
        assert_eq!(store.concept_name(38000282).unwrap(), "Chief complaint");
    }
}

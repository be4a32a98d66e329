//! Case tree builder
//!
//! Turns the page layout plus the facts of one case into the unpruned tree.
//! Each top-level layout section is resolved by the resolver of its kind.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, FetchResultExt};
use crate::domain::layout::{CHIEF_COMPLAINT, PATIENT_COMPLAINT, PATIENT_DEMOGRAPHICS};
use crate::domain::{
    concept_ref, reduce_rows, CaseId, ConceptId, DomainError, DrugExposure, LayoutEntry,
    LayoutNode, Measurement, NodeValue, Observation, PageLayout, Person, SectionKind, TreeNode,
    Visit,
};
use crate::infrastructure::traits::{ClinicalFactSource, ConceptNameResolver};

/// Background branch listing the case's drug exposures.
pub const MEDICAL_HISTORY: &str = "Medical History";

/// Unpruned tree of one case with the records it was anchored on.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTree {
    pub visit: Visit,
    pub person: Person,
    pub sections: Vec<TreeNode>,
}

/// Age, gender and chief complaint of a case, for case lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseHeadline {
    pub age: String,
    pub gender: String,
    pub chief_complaint: Option<String>,
}

/// Builds case trees against the configured page layout.
pub struct CaseTreeBuilder {
    concepts: Arc<dyn ConceptNameResolver>,
    facts: Arc<dyn ClinicalFactSource>,
    layout: Arc<PageLayout>,
}

impl CaseTreeBuilder {
    pub fn new(
        concepts: Arc<dyn ConceptNameResolver>,
        facts: Arc<dyn ClinicalFactSource>,
        layout: Arc<PageLayout>,
    ) -> Self {
        Self {
            concepts,
            facts,
            layout,
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Build the tree, one top-level node per layout section with content.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&self, case_id: CaseId) -> ApplicationResult<CaseTree> {
        let (visit, person) = self.anchor(case_id)?;

        let mut sections = Vec::with_capacity(self.layout.sections().len());
        for section in self.layout.sections() {
            let entries = section_entries(section)?;
            let kind = SectionKind::from_name(&section.name)
                .ok_or_else(|| DomainError::UnknownSection(section.name.clone()))?;
            let children = match kind {
                SectionKind::Background => self.background(case_id, &visit, &person, entries)?,
                SectionKind::Complaint => self.complaint(case_id, entries)?,
                SectionKind::Examination => self.examination(case_id, entries)?,
            };
            let node = TreeNode::branch(section.name.clone(), children);
            if node.has_content() {
                sections.push(node);
            } else {
                debug!("section '{}' has no facts for case {}", section.name, case_id);
            }
        }

        Ok(CaseTree {
            visit,
            person,
            sections,
        })
    }

    /// Demographics and chief complaint without building the whole tree.
    #[instrument(level = "debug", skip(self))]
    pub fn headline(&self, case_id: CaseId) -> ApplicationResult<CaseHeadline> {
        let (visit, person) = self.anchor(case_id)?;
        let gender = self.concept_name(person.gender_concept_id)?;

        let selector = self
            .layout
            .section(PATIENT_COMPLAINT)
            .and_then(|s| match &s.node {
                LayoutNode::Nested(entries) => entries.iter().find(|e| e.name == CHIEF_COMPLAINT),
                LayoutNode::Selector(_) => None,
            })
            .and_then(|e| match &e.node {
                LayoutNode::Selector(ids) => Some(ids.as_slice()),
                LayoutNode::Nested(_) => None,
            });
        let chief_complaint = match selector {
            Some(type_ids) => self
                .facts
                .observations_by_type(case_id, type_ids)
                .with_fetch_context("chief complaint of case", case_id)?
                .first()
                .map(|o| self.concept_name(o.concept_id))
                .transpose()?,
            None => None,
        };

        Ok(CaseHeadline {
            age: person.age_at(&visit).to_string(),
            gender,
            chief_complaint,
        })
    }

    fn anchor(&self, case_id: CaseId) -> ApplicationResult<(Visit, Person)> {
        let visit = self
            .facts
            .visit(case_id)
            .with_fetch_context("visit of case", case_id)?;
        let person = self
            .facts
            .person(visit.person_id)
            .with_fetch_context("person", visit.person_id)?;
        Ok((visit, person))
    }

    fn concept_name(&self, concept_id: ConceptId) -> ApplicationResult<String> {
        self.concepts
            .concept_name(concept_id)
            .with_fetch_context("concept", concept_id)
    }

    // ============================================================
    // BACKGROUND
    // ============================================================

    fn background(
        &self,
        case_id: CaseId,
        visit: &Visit,
        person: &Person,
        entries: &[LayoutEntry],
    ) -> ApplicationResult<Vec<TreeNode>> {
        let mut children = vec![self.demographics(visit, person)?];
        let drugs = self
            .facts
            .drug_exposures(case_id)
            .with_fetch_context("drug exposures of case", case_id)?;
        if !drugs.is_empty() {
            children.push(self.medical_history(&drugs)?);
        }
        children.extend(self.nested_fields(case_id, entries)?);
        Ok(children)
    }

    fn demographics(&self, visit: &Visit, person: &Person) -> ApplicationResult<TreeNode> {
        Ok(TreeNode::branch(
            PATIENT_DEMOGRAPHICS,
            vec![
                TreeNode::text("Age", person.age_at(visit).to_string()),
                TreeNode::text("Gender", self.concept_name(person.gender_concept_id)?),
            ],
        ))
    }

    fn medical_history(&self, drugs: &[DrugExposure]) -> ApplicationResult<TreeNode> {
        let nodes = drugs
            .iter()
            .map(|drug| {
                Ok(TreeNode::new(
                    self.concept_name(drug.drug_concept_id)?,
                    NodeValue::List(drug_lines(drug)),
                ))
            })
            .collect::<ApplicationResult<Vec<_>>>()?;
        Ok(TreeNode::branch(MEDICAL_HISTORY, nodes))
    }

    /// Leaf selectors fetch observations by concept; mappings recurse.
    fn nested_fields(
        &self,
        case_id: CaseId,
        entries: &[LayoutEntry],
    ) -> ApplicationResult<Vec<TreeNode>> {
        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            let node = match &entry.node {
                LayoutNode::Selector(ids) => {
                    let rows = self
                        .facts
                        .observations_by_concept(case_id, ids)
                        .with_fetch_context(&format!("observations '{}' of case", entry.name), case_id)?;
                    TreeNode::new(
                        entry.name.clone(),
                        reduce_rows(&rows, |o| self.observation_value(o))?,
                    )
                }
                LayoutNode::Nested(inner) => {
                    TreeNode::branch(entry.name.clone(), self.nested_fields(case_id, inner)?)
                }
            };
            if node.has_content() {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    // ============================================================
    // PATIENT COMPLAINT
    // ============================================================

    fn complaint(&self, case_id: CaseId, entries: &[LayoutEntry]) -> ApplicationResult<Vec<TreeNode>> {
        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            let type_ids = selector_ids(entry)?;
            let rows = self
                .facts
                .observations_by_type(case_id, type_ids)
                .with_fetch_context(&format!("observations '{}' of case", entry.name), case_id)?;

            let children = group_in_order(rows, |o| o.concept_id)
                .into_iter()
                .map(|(concept_id, group)| {
                    Ok(TreeNode::new(
                        self.concept_name(concept_id)?,
                        reduce_rows(&group, |o| self.observation_value(o))?,
                    ))
                })
                .collect::<ApplicationResult<Vec<_>>>()?;

            let node = TreeNode::branch(entry.name.clone(), children);
            if node.has_content() {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    // ============================================================
    // PHYSICAL EXAMINATION
    // ============================================================

    /// Direct measurements of the configured concepts, else measurements reached
    /// from them as parents. Either way the node is named after the first concept.
    fn examination(&self, case_id: CaseId, entries: &[LayoutEntry]) -> ApplicationResult<Vec<TreeNode>> {
        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            let ids = selector_ids(entry)?;
            let Some(&first) = ids.first() else {
                continue;
            };

            let direct = self
                .facts
                .measurements(case_id, ids)
                .with_fetch_context(&format!("measurements '{}' of case", entry.name), case_id)?;
            if !direct.is_empty() {
                let value = reduce_rows(&direct, |m| self.measurement_value(m))?;
                if value.has_content() {
                    nodes.push(TreeNode::new(self.concept_name(first)?, value));
                }
                continue;
            }

            let rows = self
                .facts
                .measurements_of_parents(case_id, ids)
                .with_fetch_context(&format!("child measurements '{}' of case", entry.name), case_id)?;
            if rows.is_empty() {
                continue;
            }
            debug!("'{}' resolved through relationships: {} rows", entry.name, rows.len());

            let children = group_in_order(rows, |m| m.concept_id)
                .into_iter()
                .map(|(concept_id, group)| {
                    Ok(TreeNode::new(
                        self.concept_name(concept_id)?,
                        reduce_rows(&group, |m| self.measurement_value(m))?,
                    ))
                })
                .collect::<ApplicationResult<Vec<_>>>()?;
            nodes.push(TreeNode::branch(self.concept_name(first)?, children));
        }
        Ok(nodes)
    }

    // ============================================================
    // ROW VALUES
    // ============================================================

    /// `[qualifier : ]value[ unit]`, value being text, number, concept or raw unit text.
    pub fn observation_value(&self, row: &Observation) -> ApplicationResult<Option<String>> {
        let base = if let Some(text) = non_blank(row.value_as_string.as_deref()) {
            Some(text.to_string())
        } else {
            self.numeric_or_concept(row.value_as_number, row.value_as_concept_id)?
        };
        let Some(value) = self.with_unit(base, row.unit_concept_id, row.unit_source_value.as_deref())? else {
            return Ok(None);
        };
        Ok(Some(match concept_ref(row.qualifier_concept_id) {
            Some(qualifier) => format!("{} : {}", self.concept_name(qualifier)?, value),
            None => value,
        }))
    }

    /// `[operator ]value[ unit]`, value being number, concept or raw unit text.
    pub fn measurement_value(&self, row: &Measurement) -> ApplicationResult<Option<String>> {
        let base = self.numeric_or_concept(row.value_as_number, row.value_as_concept_id)?;
        let Some(value) = self.with_unit(base, row.unit_concept_id, row.unit_source_value.as_deref())? else {
            return Ok(None);
        };
        Ok(Some(match concept_ref(row.operator_concept_id) {
            Some(operator) => format!("{} {}", self.concept_name(operator)?, value),
            None => value,
        }))
    }

    fn numeric_or_concept(
        &self,
        number: Option<f64>,
        concept: Option<ConceptId>,
    ) -> ApplicationResult<Option<String>> {
        if let Some(n) = number {
            return Ok(Some(n.to_string()));
        }
        concept_ref(concept).map(|c| self.concept_name(c)).transpose()
    }

    /// Append the unit name; without a value the raw unit text stands alone.
    fn with_unit(
        &self,
        base: Option<String>,
        unit: Option<ConceptId>,
        unit_source: Option<&str>,
    ) -> ApplicationResult<Option<String>> {
        match base {
            Some(value) => Ok(Some(match concept_ref(unit) {
                Some(unit) => format!("{} {}", value, self.concept_name(unit)?),
                None => value,
            })),
            None => Ok(non_blank(unit_source).map(str::to_string)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn drug_lines(drug: &DrugExposure) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if let Some(quantity) = drug.quantity {
        lines.push(format!("Quantity: {quantity}"));
    }
    if let Some(days) = drug.days_supply {
        lines.push(format!("Duration: {days}"));
    }
    lines
}

fn section_entries(section: &LayoutEntry) -> Result<&[LayoutEntry], DomainError> {
    match &section.node {
        LayoutNode::Nested(entries) => Ok(entries),
        LayoutNode::Selector(_) => Err(DomainError::InvalidLayout {
            path: section.name.clone(),
            message: "section must map names to selectors".into(),
        }),
    }
}

fn selector_ids(entry: &LayoutEntry) -> Result<&[ConceptId], DomainError> {
    match &entry.node {
        LayoutNode::Selector(ids) => Ok(ids),
        LayoutNode::Nested(_) => Err(DomainError::InvalidLayout {
            path: entry.name.clone(),
            message: "expected a list of concept ids".into(),
        }),
    }
}

/// Group rows by key, groups ordered by first appearance, rows by fetch order.
fn group_in_order<T>(rows: Vec<T>, key_of: impl Fn(&T) -> ConceptId) -> Vec<(ConceptId, Vec<T>)> {
    let mut index: HashMap<ConceptId, usize> = HashMap::new();
    let mut groups: Vec<(ConceptId, Vec<T>)> = Vec::new();
    for row in rows {
        let key = key_of(&row);
        match index.get(&key) {
            Some(&idx) => groups[idx].1.push(row),
            None => {
                index.insert(key, groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;
    use crate::infrastructure::MemoryStore;

    fn builder(store: MemoryStore) -> CaseTreeBuilder {
        let store = Arc::new(store);
        CaseTreeBuilder::new(store.clone(), store, Arc::new(PageLayout::reference()))
    }

    fn units() -> MemoryStore {
        MemoryStore::new()
            .with_concept(8582, "cm")
            .with_concept(4172703, "=")
            .with_concept(4172704, ">")
            .with_concept(4125022, "Severe")
            .with_concept(4181412, "Present")
    }

    #[rstest]
    #[case(Observation::text(1, "Yes"), Some("Yes"))]
    #[case(Observation { value_as_number: Some(0.0), ..Observation::default() }, Some("0"))]
    #[case(Observation { value_as_number: Some(172.0), unit_concept_id: Some(8582), ..Observation::default() }, Some("172 cm"))]
    #[case(Observation { value_as_concept_id: Some(4181412), qualifier_concept_id: Some(4125022), ..Observation::default() }, Some("Severe : Present"))]
    #[case(Observation { unit_source_value: Some("2 packs".into()), ..Observation::default() }, Some("2 packs"))]
    #[case(Observation { value_as_string: Some("".into()), value_as_concept_id: Some(0), ..Observation::default() }, None)]
    fn given_observation_when_formatting_then_applies_precedence(
        #[case] row: Observation,
        #[case] expected: Option<&str>,
    ) {
        let value = builder(units()).observation_value(&row).unwrap();
        assert_eq!(value.as_deref(), expected);
    }

    #[rstest]
    #[case(Measurement::number(1, 37.5), Some("37.5"))]
    #[case(Measurement { value_as_number: Some(140.0), operator_concept_id: Some(4172704), ..Measurement::default() }, Some("> 140"))]
    #[case(Measurement { value_as_concept_id: Some(4181412), unit_concept_id: Some(0), ..Measurement::default() }, Some("Present"))]
    #[case(Measurement::default(), None)]
    fn given_measurement_when_formatting_then_prepends_operator(
        #[case] row: Measurement,
        #[case] expected: Option<&str>,
    ) {
        let value = builder(units()).measurement_value(&row).unwrap();
        assert_eq!(value.as_deref(), expected);
    }

    #[test]
    fn given_rows_when_grouping_then_keeps_first_appearance_order() {
        let groups = group_in_order(vec![(3, 'a'), (1, 'b'), (3, 'c')], |r| r.0);
        let keys: Vec<_> = groups.iter().map(|g| g.0).collect();
        assert_eq!(keys, vec![3, 1]);
        assert_eq!(groups[0].1, vec![(3, 'a'), (3, 'c')]);
    }

    #[test]
    fn given_drug_without_supply_when_listing_then_omits_duration() {
        let drug = DrugExposure {
            drug_concept_id: 1,
            quantity: Some(30.0),
            days_supply: None,
        };
        assert_eq!(drug_lines(&drug), vec!["Quantity: 30".to_string()]);
    }

    #[test]
    fn given_case_without_complaints_when_building_then_omits_section() {
        let store = units()
            .with_concept(8532, "FEMALE")
            .with_visit(
                1,
                Visit {
                    person_id: 10,
                    visit_start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                },
            )
            .with_person(Person {
                person_id: 10,
                year_of_birth: 1980,
                gender_concept_id: 8532,
                person_label: "Patient B".into(),
            });
        let tree = builder(store).build(1).unwrap();

        let keys: Vec<_> = tree.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["BACKGROUND"]);
        assert_eq!(tree.sections[0].children()[0].key, PATIENT_DEMOGRAPHICS);
    }
}

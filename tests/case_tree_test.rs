//! Tests for CaseTreeBuilder

use std::sync::Arc;

use casereview::application::services::CaseTreeBuilder;
use casereview::application::ApplicationError;
use casereview::domain::layout::{BACKGROUND, PATIENT_COMPLAINT, PATIENT_DEMOGRAPHICS, PHYSICAL_EXAMINATION};
use casereview::domain::{NodeValue, PageLayout, TreeNode};
use casereview::infrastructure::{FetchError, MemoryStore};
use casereview::util::testing::{init_test_setup, sample_store, SAMPLE_CASE};

fn builder_for(store: MemoryStore) -> CaseTreeBuilder {
    let store = Arc::new(store);
    CaseTreeBuilder::new(store.clone(), store, Arc::new(PageLayout::reference()))
}

fn section<'a>(sections: &'a [TreeNode], key: &str) -> &'a TreeNode {
    sections
        .iter()
        .find(|s| s.key == key)
        .unwrap_or_else(|| panic!("missing section {key}"))
}

#[test]
fn given_sample_case_when_building_then_sections_follow_layout_order() {
    init_test_setup();
    let builder = builder_for(sample_store());

    let tree = builder.build(SAMPLE_CASE).unwrap();

    let keys: Vec<_> = tree.sections.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec![BACKGROUND, PATIENT_COMPLAINT, PHYSICAL_EXAMINATION]);
    assert_eq!(tree.person.person_label, "Patient A");
}

#[test]
fn given_sample_case_when_building_then_background_starts_with_demographics_and_drugs() {
    init_test_setup();
    // Arrange
    let builder = builder_for(sample_store());

    // Act
    let tree = builder.build(SAMPLE_CASE).unwrap();

    // Assert
    let background = section(&tree.sections, BACKGROUND);
    let keys: Vec<_> = background.children().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![PATIENT_DEMOGRAPHICS, "Medical History", "Family History", "Social History"]
    );

    let demographics = background.child(PATIENT_DEMOGRAPHICS).unwrap();
    assert_eq!(demographics.child("Age").unwrap().value, NodeValue::Text("36".into()));
    assert_eq!(demographics.child("Gender").unwrap().value, NodeValue::Text("FEMALE".into()));

    let drugs = background.child("Medical History").unwrap();
    assert_eq!(
        drugs.children()[0],
        TreeNode::new(
            "Aspirin 81 MG Oral Tablet",
            NodeValue::List(vec!["Quantity: 30".into(), "Duration: 30".into()])
        )
    );
}

#[test]
fn given_multi_and_single_row_fields_when_building_then_reduces_to_list_and_text() {
    init_test_setup();
    let tree = builder_for(sample_store()).build(SAMPLE_CASE).unwrap();
    let background = section(&tree.sections, BACKGROUND);

    assert_eq!(
        background.child("Family History").unwrap().value,
        NodeValue::List(vec!["Cancer: Yes".into(), "Diabetes: No".into()])
    );
    let social = background.child("Social History").unwrap();
    assert_eq!(social.children(), &[TreeNode::text("Smoke", "Never smoker")]);
}

#[test]
fn given_complaints_when_building_then_groups_by_concept_in_fetch_order() {
    init_test_setup();
    let tree = builder_for(sample_store()).build(SAMPLE_CASE).unwrap();

    let complaint = section(&tree.sections, PATIENT_COMPLAINT);
    assert_eq!(complaint.children().len(), 1, "Current Symptoms has no facts");
    let chief = complaint.child("Chief Complaint").unwrap();
    assert_eq!(
        chief.children(),
        &[
            TreeNode::text("Abdominal pain", "3 weeks"),
            TreeNode::text("Blood in stool", "Yes"),
        ]
    );
}

#[test]
fn given_direct_and_related_measurements_when_building_then_names_nodes_after_concepts() {
    init_test_setup();
    let tree = builder_for(sample_store()).build(SAMPLE_CASE).unwrap();

    let exam = section(&tree.sections, PHYSICAL_EXAMINATION);
    assert_eq!(
        exam.child("Physical characteristics").unwrap().value,
        NodeValue::Text("172 cm".into())
    );
    let vitals = exam.child("Vital signs").unwrap();
    assert_eq!(
        vitals.children(),
        &[
            TreeNode::text("Heart rate", "72 /min"),
            TreeNode::text("Body temperature", "37.2 degree Celsius"),
        ]
    );
    assert_eq!(exam.children().len(), 2);
}

#[test]
fn given_unchanged_store_when_building_twice_then_trees_are_equal() {
    init_test_setup();
    let builder = builder_for(sample_store());
    assert_eq!(builder.build(SAMPLE_CASE).unwrap(), builder.build(SAMPLE_CASE).unwrap());
}

#[test]
fn given_any_case_when_building_then_no_top_level_node_is_empty() {
    init_test_setup();
    let tree = builder_for(sample_store()).build(SAMPLE_CASE).unwrap();
    assert!(tree.sections.iter().all(|s| s.has_content()));
}

#[test]
fn given_unknown_case_when_building_then_reports_missing_visit() {
    init_test_setup();
    let result = builder_for(sample_store()).build(999);

    match result {
        Err(ApplicationError::Upstream { context, source }) => {
            assert!(context.contains("999"));
            assert!(matches!(source, FetchError::NotFound { what: "visit", .. }));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[test]
fn given_unavailable_source_when_building_then_propagates_failure() {
    init_test_setup();
    let result = builder_for(sample_store().failing("connection reset")).build(SAMPLE_CASE);

    assert!(matches!(
        result,
        Err(ApplicationError::Upstream {
            source: FetchError::Unavailable(_),
            ..
        })
    ));
}

#[test]
fn given_sample_case_when_reading_headline_then_returns_age_gender_and_complaint() {
    init_test_setup();
    let headline = builder_for(sample_store()).headline(SAMPLE_CASE).unwrap();

    assert_eq!(headline.age, "36");
    assert_eq!(headline.gender, "FEMALE");
    assert_eq!(headline.chief_complaint.as_deref(), Some("Abdominal pain"));
}

#[test]
fn given_custom_layout_when_building_then_only_configured_sections_appear() {
    init_test_setup();
    let layout = PageLayout::from_json(r#"{"PHYSICAL EXAMINATION": {"Vitals": [4263222]}}"#).unwrap();
    let store = Arc::new(sample_store());
    let builder = CaseTreeBuilder::new(store.clone(), store, Arc::new(layout));

    let tree = builder.build(SAMPLE_CASE).unwrap();

    assert_eq!(tree.sections.len(), 1);
    assert_eq!(tree.sections[0].children()[0].key, "Vital signs");
}

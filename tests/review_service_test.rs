//! Tests for CaseReviewService

use std::sync::Arc;

use rstest::rstest;

use casereview::application::services::CaseReviewService;
use casereview::application::ApplicationError;
use casereview::config::Settings;
use casereview::domain::{NodeStyle, NodeValue, TreeNode};
use casereview::infrastructure::di::ServiceContainer;
use casereview::infrastructure::traits::RealFileSystem;
use casereview::infrastructure::MemoryStore;
use casereview::util::testing::{init_test_setup, sample_store, SAMPLE_CASE};

const CAPTION: &str = "<6: Low; 6-11: Medium; >11: High";

fn container_for(store: MemoryStore) -> ServiceContainer {
    let store = Arc::new(store);
    ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(RealFileSystem),
        store.clone(),
        store.clone(),
        store,
    )
    .expect("container wires with reference layout")
}

fn service() -> CaseReviewService {
    container_for(sample_store()).review
}

#[test]
fn given_owner_when_reviewing_then_keeps_only_configured_family_history() {
    init_test_setup();

    let review = service().review_case("cfg-alice", "alice").unwrap();

    let background = &review.details[0];
    let family = background.child("Family History").unwrap();
    assert_eq!(family.value, NodeValue::List(vec!["Cancer: Yes".into()]));
    assert_eq!(
        family.style,
        Some(NodeStyle {
            highlight: Some(true),
            ..NodeStyle::default()
        })
    );
}

#[test]
fn given_owner_when_reviewing_then_assembles_label_and_case_number() {
    init_test_setup();
    let review = service().review_case("cfg-alice", "alice").unwrap();

    assert_eq!(review.person_label, "Patient A");
    assert_eq!(review.case_number, SAMPLE_CASE.to_string());
    assert_eq!(review.details.len(), 3);
}

#[test]
fn given_unconfigured_children_when_reviewing_then_their_content_is_cleared() {
    init_test_setup();
    let review = service().review_case("cfg-alice", "alice").unwrap();

    let background = &review.details[0];
    assert_eq!(
        background.child("Medical History").unwrap().value,
        NodeValue::Children(vec![])
    );
    let exam = &review.details[2];
    assert_eq!(
        exam.child("Physical characteristics").unwrap().value,
        NodeValue::Empty
    );
    // demographics and complaints are never pruned
    assert_eq!(background.child("Patient Demographics").unwrap().children().len(), 2);
    assert_eq!(review.details[1].child("Chief Complaint").unwrap().children().len(), 2);
}

#[test]
fn given_weighted_directives_when_reviewing_then_infos_ascend_and_risk_is_last() {
    init_test_setup();
    let review = service().review_case("cfg-alice", "alice").unwrap();

    let keys: Vec<_> = review.important_infos.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["Vital signs", "Social History", CAPTION]);
    assert_eq!(
        review.important_infos[0].value,
        NodeValue::Children(vec![TreeNode::text("Heart rate", "72 /min")])
    );
}

#[test]
fn given_section_toggle_without_literals_when_reviewing_then_relabels_adjusted_risk() {
    init_test_setup();
    let review = service().review_case("cfg-alice", "alice").unwrap();

    let risk = review.important_infos.last().unwrap();
    assert_eq!(risk.value, NodeValue::Text("AI-Predicted CRC Risk Score: 0.31".into()));
}

#[test]
fn given_literal_scores_when_reviewing_then_emits_predicted_min_and_max() {
    init_test_setup();
    let review = service().review_case("cfg-bob", "bob").unwrap();

    assert_eq!(
        review.important_infos,
        vec![
            TreeNode::text(CAPTION, "Predicted Colorectal Cancer Score: 3"),
            TreeNode::text("Min Predicted Colorectal Cancer Score", "3"),
            TreeNode::text("Max Predicted Colorectal Cancer Score", "9"),
        ]
    );
}

#[rstest]
#[case("cfg-alice", "bob")]
#[case("cfg-bob", "alice")]
#[case("cfg-missing", "alice")]
fn given_foreign_or_missing_config_when_reviewing_then_access_denied(
    #[case] config_id: &str,
    #[case] user: &str,
) {
    init_test_setup();
    let result = service().review_case(config_id, user);

    assert!(matches!(
        result,
        Err(ApplicationError::Access { config_id: id }) if id == config_id
    ));
}

#[test]
fn given_literal_score_when_reviewing_then_derived_observation_not_used() {
    init_test_setup();
    let store = sample_store().with_display_config(casereview::domain::DisplayConfig {
        id: "cfg-both".into(),
        owner_user_id: "alice".into(),
        case_id: SAMPLE_CASE,
        entries: vec![
            casereview::domain::DisplayConfigEntry::new("RISK ASSESSMENT", Default::default()),
            casereview::domain::DisplayConfigEntry::new(
                "RISK ASSESSMENT.Colorectal Cancer Score: 8",
                Default::default(),
            ),
        ],
    });

    let review = container_for(store).review.review_case("cfg-both", "alice").unwrap();

    assert_eq!(
        review.important_infos,
        vec![TreeNode::text(CAPTION, "Predicted Colorectal Cancer Score: 8")]
    );
}

#[test]
fn given_unavailable_store_when_reviewing_then_upstream_error() {
    init_test_setup();
    let result = container_for(sample_store().failing("timeout"))
        .review
        .review_case("cfg-alice", "alice");

    assert!(matches!(result, Err(ApplicationError::Upstream { .. })));
}

#[test]
fn given_reviewer_when_listing_cases_then_summarizes_owned_configs() {
    init_test_setup();
    let summaries = service().case_summaries("alice").unwrap();

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.config_id, "cfg-alice");
    assert_eq!(summary.case_id, SAMPLE_CASE);
    assert_eq!(summary.age, "36");
    assert_eq!(summary.gender, "FEMALE");
    assert_eq!(summary.patient_chief_complaint.as_deref(), Some("Abdominal pain"));
}

#[test]
fn given_unknown_reviewer_when_listing_cases_then_empty() {
    init_test_setup();
    assert!(service().case_summaries("carol").unwrap().is_empty());
}

#[test]
fn given_review_when_serialized_then_uses_camel_case_fields() {
    init_test_setup();
    let review = service().review_case("cfg-bob", "bob").unwrap();

    let json = serde_json::to_value(&review).unwrap();

    assert_eq!(json["personLabel"], "Patient A");
    assert_eq!(json["caseNumber"], "1");
    assert!(json["importantInfos"].is_array());
    assert_eq!(json["details"][0]["key"], "BACKGROUND");
}

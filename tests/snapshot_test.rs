//! Tests for snapshot loading and container wiring from settings

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use casereview::application::ApplicationError;
use casereview::config::Settings;
use casereview::domain::DomainError;
use casereview::infrastructure::di::{load_layout, ServiceContainer};
use casereview::infrastructure::traits::RealFileSystem;
use casereview::infrastructure::InfraError;
use casereview::util::testing::{init_test_setup, sample_store};

fn write_snapshot(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("snapshot.json");
    let json = serde_json::to_string_pretty(&sample_store()).expect("serialize store");
    fs::write(&path, json).expect("write snapshot");
    path
}

#[test]
fn given_snapshot_file_when_creating_container_then_reviews_from_it() {
    init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        snapshot_path: write_snapshot(&temp),
        ..Settings::default()
    };

    // Act
    let container = ServiceContainer::new(settings).unwrap();
    let review = container.review.review_case("cfg-bob", "bob").unwrap();

    // Assert
    assert_eq!(review.person_label, "Patient A");
    assert_eq!(review.important_infos.len(), 3);
}

#[test]
fn given_missing_snapshot_when_creating_container_then_reports_it() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        snapshot_path: temp.path().join("absent.json"),
        ..Settings::default()
    };

    let result = ServiceContainer::new(settings);

    assert!(matches!(result, Err(InfraError::SnapshotMissing(_))));
}

#[test]
fn given_layout_file_when_creating_container_then_uses_it() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let layout_path = temp.path().join("layout.json");
    fs::write(
        &layout_path,
        r#"{"BACKGROUND": {"Family History": [4167217]}}"#,
    )
    .unwrap();
    let settings = Settings {
        snapshot_path: write_snapshot(&temp),
        layout_path: Some(layout_path),
        ..Settings::default()
    };

    let container = ServiceContainer::new(settings).unwrap();
    let tree = container.trees.build(1).unwrap();

    assert_eq!(tree.sections.len(), 1);
    let keys: Vec<_> = tree.sections[0].children().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["Patient Demographics", "Medical History", "Family History"]);
    assert_eq!(
        serde_json::to_value(container.trees.layout()).unwrap(),
        serde_json::json!({"BACKGROUND": {"Family History": [4167217]}})
    );
}

#[test]
fn given_layout_with_unknown_section_when_loading_then_domain_error() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let layout_path = temp.path().join("layout.json");
    fs::write(&layout_path, r#"{"LAB RESULTS": {"Panel": [1]}}"#).unwrap();

    let result = load_layout(&RealFileSystem, Some(&layout_path));

    assert!(matches!(
        result,
        Err(InfraError::Application(ApplicationError::Domain(DomainError::UnknownSection(_))))
    ));
}

#[test]
fn given_unreadable_layout_path_when_loading_then_io_error() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let result = load_layout(&RealFileSystem, Some(&temp.path().join("nope.json")));
    assert!(matches!(result, Err(InfraError::Io { .. })));
}

#[test]
fn given_invalid_risk_label_settings_when_wiring_then_still_escapes_label() {
    init_test_setup();
    let mut settings = Settings::default();
    settings.risk.score_label = "Score [beta".into();
    let store = Arc::new(sample_store());

    let container = ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        store.clone(),
        store.clone(),
        store,
    );

    assert!(container.is_ok());
}

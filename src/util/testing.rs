use std::sync::Once;

use chrono::NaiveDate;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::display::{DisplayConfigEntry, EntryStyle};
use crate::domain::{DisplayConfig, DrugExposure, Measurement, Observation, Person, Visit};
use crate::infrastructure::MemoryStore;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("Error: Failed to set up logging: {}", e);
    }
}

// ============================================================
// SAMPLE CASE
// ============================================================

pub const SAMPLE_CASE: i64 = 1;
pub const SAMPLE_PERSON: i64 = 10;
pub const EHR_RECORD: i64 = 32817;

pub const FAMILY_HISTORY: i64 = 4167217;
pub const SMOKE: i64 = 4041306;
pub const CHIEF_COMPLAINT_TYPE: i64 = 38000282;
pub const PHYSICAL_CHARACTERISTICS: i64 = 4086988;
pub const VITAL_SIGNS: i64 = 4263222;
pub const HEART_RATE: i64 = 3027018;
pub const BODY_TEMPERATURE: i64 = 3020891;
pub const DERIVED_RISK: i64 = 45614722;

/// Facts of one female patient, 36 at the visit, with two reviewers' configurations.
///
/// * `cfg-alice` (owner `alice`): keeps "Cancer: Yes" highlighted, ranks Smoke
///   and the vital signs, toggles the risk section on.
/// * `cfg-bob` (owner `bob`): literal risk scores 3 and 9.
pub fn sample_store() -> MemoryStore {
    MemoryStore::new()
        .with_concept(8532, "FEMALE")
        .with_concept(8582, "cm")
        .with_concept(8541, "/min")
        .with_concept(586323, "degree Celsius")
        .with_concept(200219, "Abdominal pain")
        .with_concept(4213186, "Blood in stool")
        .with_concept(1127078, "Aspirin 81 MG Oral Tablet")
        .with_concept(PHYSICAL_CHARACTERISTICS, "Physical characteristics")
        .with_concept(VITAL_SIGNS, "Vital signs")
        .with_concept(HEART_RATE, "Heart rate")
        .with_concept(BODY_TEMPERATURE, "Body temperature")
        .with_visit(
            SAMPLE_CASE,
            Visit {
                person_id: SAMPLE_PERSON,
                visit_start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default(),
            },
        )
        .with_person(Person {
            person_id: SAMPLE_PERSON,
            year_of_birth: 1988,
            gender_concept_id: 8532,
            person_label: "Patient A".into(),
        })
        .with_observation(SAMPLE_CASE, EHR_RECORD, Observation::text(FAMILY_HISTORY, "Cancer: Yes"))
        .with_observation(SAMPLE_CASE, EHR_RECORD, Observation::text(FAMILY_HISTORY, "Diabetes: No"))
        .with_observation(SAMPLE_CASE, EHR_RECORD, Observation::text(SMOKE, "Never smoker"))
        .with_observation(SAMPLE_CASE, CHIEF_COMPLAINT_TYPE, Observation::text(200219, "3 weeks"))
        .with_observation(SAMPLE_CASE, CHIEF_COMPLAINT_TYPE, Observation::text(4213186, "Yes"))
        .with_observation(
            SAMPLE_CASE,
            EHR_RECORD,
            Observation::text(DERIVED_RISK, "Adjusted CRC Risk: 0.31"),
        )
        .with_measurement(
            SAMPLE_CASE,
            Measurement {
                unit_concept_id: Some(8582),
                ..Measurement::number(PHYSICAL_CHARACTERISTICS, 172.0)
            },
        )
        .with_relationship(VITAL_SIGNS, HEART_RATE, "Subsumes")
        .with_relationship(VITAL_SIGNS, BODY_TEMPERATURE, "Is characterized by")
        .with_measurement(
            SAMPLE_CASE,
            Measurement {
                unit_concept_id: Some(8541),
                ..Measurement::number(HEART_RATE, 72.0)
            },
        )
        .with_measurement(
            SAMPLE_CASE,
            Measurement {
                unit_concept_id: Some(586323),
                ..Measurement::number(BODY_TEMPERATURE, 37.2)
            },
        )
        .with_drug_exposure(
            SAMPLE_CASE,
            DrugExposure {
                drug_concept_id: 1127078,
                quantity: Some(30.0),
                days_supply: Some(30),
            },
        )
        .with_display_config(DisplayConfig {
            id: "cfg-alice".into(),
            owner_user_id: "alice".into(),
            case_id: SAMPLE_CASE,
            entries: vec![
                entry("BACKGROUND.Family History.Cancer: Yes", None, Some(true), None),
                entry("BACKGROUND.Social History.Smoke", Some(true), None, Some(3.0)),
                entry("PHYSICAL EXAMINATION.Vital signs.Heart rate", None, None, Some(1.0)),
                entry("RISK ASSESSMENT", None, None, None),
            ],
        })
        .with_display_config(DisplayConfig {
            id: "cfg-bob".into(),
            owner_user_id: "bob".into(),
            case_id: SAMPLE_CASE,
            entries: vec![
                entry("RISK ASSESSMENT.Colorectal Cancer Score: 3", None, None, None),
                entry("RISK ASSESSMENT.Colorectal Cancer Score: 9", None, None, None),
            ],
        })
}

fn entry(
    path: &str,
    collapse: Option<bool>,
    highlight: Option<bool>,
    top: Option<f64>,
) -> DisplayConfigEntry {
    DisplayConfigEntry::new(
        path,
        EntryStyle {
            collapse,
            highlight,
            top,
        },
    )
}

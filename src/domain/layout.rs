//! Static page layout: which concepts feed which section of the case tree.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::entities::ConceptId;
use crate::domain::error::DomainError;

pub const BACKGROUND: &str = "BACKGROUND";
pub const PATIENT_COMPLAINT: &str = "PATIENT COMPLAINT";
pub const PHYSICAL_EXAMINATION: &str = "PHYSICAL EXAMINATION";
pub const PATIENT_DEMOGRAPHICS: &str = "Patient Demographics";
pub const CHIEF_COMPLAINT: &str = "Chief Complaint";

/// How a top-level section is resolved against the fact source.
///
/// The set is closed: a new kind of section needs a new variant and a new
/// resolver in the tree builder. Layout files may only reorder or reconfigure
/// the three known sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Demographics, medications, then nested observation fields.
    Background,
    /// Observations grouped by observation type.
    Complaint,
    /// Measurements, direct or through concept relationships.
    Examination,
}

impl SectionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            BACKGROUND => Some(SectionKind::Background),
            PATIENT_COMPLAINT => Some(SectionKind::Complaint),
            PHYSICAL_EXAMINATION => Some(SectionKind::Examination),
            _ => None,
        }
    }
}

/// Node of the layout: a concept selector or a nested, ordered mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    Selector(Vec<ConceptId>),
    Nested(Vec<LayoutEntry>),
}

/// Named child of a nested layout node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub name: String,
    pub node: LayoutNode,
}

impl LayoutEntry {
    pub fn new(name: impl Into<String>, node: LayoutNode) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }

    fn selector(name: &str, ids: &[ConceptId]) -> Self {
        Self::new(name, LayoutNode::Selector(ids.to_vec()))
    }
}

/// Top-level layout; section order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    sections: Vec<LayoutEntry>,
}

impl PageLayout {
    pub fn new(sections: Vec<LayoutEntry>) -> Self {
        Self { sections }
    }

    /// Layout of the reference deployment.
    pub fn reference() -> Self {
        Self::new(vec![
            LayoutEntry::new(
                BACKGROUND,
                LayoutNode::Nested(vec![
                    LayoutEntry::selector("Family History", &[4167217]),
                    LayoutEntry::new(
                        "Social History",
                        LayoutNode::Nested(vec![
                            LayoutEntry::selector("Smoke", &[4041306]),
                            LayoutEntry::selector("Alcohol", &[4238768]),
                            LayoutEntry::selector("Drug use", &[4038710]),
                            LayoutEntry::selector("Sexual behavior", &[4283657, 4314454]),
                        ]),
                    ),
                ]),
            ),
            LayoutEntry::new(
                PATIENT_COMPLAINT,
                LayoutNode::Nested(vec![
                    LayoutEntry::selector(CHIEF_COMPLAINT, &[38000282]),
                    LayoutEntry::selector("Current Symptoms", &[4034855]),
                ]),
            ),
            LayoutEntry::new(
                PHYSICAL_EXAMINATION,
                LayoutNode::Nested(vec![
                    LayoutEntry::selector("Physical Characteristics", &[4086988]),
                    LayoutEntry::selector("Vital Signs", &[4263222]),
                    LayoutEntry::selector("Cardiovascular", &[36717771]),
                    LayoutEntry::selector("Ophthalmology", &[4080843]),
                    LayoutEntry::selector("Respiratory", &[4090320]),
                    LayoutEntry::selector("Abdominal", &[4152368]),
                    LayoutEntry::selector("Neurological", &[4154954]),
                ]),
            ),
        ])
    }

    /// Parse a JSON layout document, keeping key order.
    pub fn from_json(content: &str) -> Result<Self, DomainError> {
        let layout: Self =
            serde_json::from_str(content).map_err(|e| DomainError::InvalidLayout {
                path: String::new(),
                message: e.to_string(),
            })?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn sections(&self) -> &[LayoutEntry] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&LayoutEntry> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Reject unknown sections, flat sections and empty selectors.
    pub fn validate(&self) -> Result<(), DomainError> {
        for section in &self.sections {
            let kind = SectionKind::from_name(&section.name)
                .ok_or_else(|| DomainError::UnknownSection(section.name.clone()))?;
            let LayoutNode::Nested(entries) = &section.node else {
                return Err(DomainError::InvalidLayout {
                    path: section.name.clone(),
                    message: "section must map names to selectors".into(),
                });
            };
            for entry in entries {
                let path = format!("{}.{}", section.name, entry.name);
                match (kind, &entry.node) {
                    (SectionKind::Background, node) => validate_node(&path, node)?,
                    (_, LayoutNode::Selector(ids)) if !ids.is_empty() => {}
                    (_, _) => {
                        return Err(DomainError::InvalidLayout {
                            path,
                            message: "expected a non-empty list of concept ids".into(),
                        })
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::reference()
    }
}

fn validate_node(path: &str, node: &LayoutNode) -> Result<(), DomainError> {
    match node {
        LayoutNode::Selector(ids) if ids.is_empty() => Err(DomainError::InvalidLayout {
            path: path.to_string(),
            message: "empty concept selector".into(),
        }),
        LayoutNode::Selector(_) => Ok(()),
        LayoutNode::Nested(entries) => entries
            .iter()
            .try_for_each(|e| validate_node(&format!("{}.{}", path, e.name), &e.node)),
    }
}

// ============================================================
// SERDE
// ============================================================

impl Serialize for LayoutNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LayoutNode::Selector(ids) => {
                let mut seq = serializer.serialize_seq(Some(ids.len()))?;
                for id in ids {
                    seq.serialize_element(id)?;
                }
                seq.end()
            }
            LayoutNode::Nested(entries) => serialize_entries(entries, serializer),
        }
    }
}

impl Serialize for PageLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_entries(&self.sections, serializer)
    }
}

fn serialize_entries<S: Serializer>(
    entries: &[LayoutEntry],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for entry in entries {
        map.serialize_entry(&entry.name, &entry.node)?;
    }
    map.end()
}

struct LayoutNodeVisitor;

impl<'de> Visitor<'de> for LayoutNodeVisitor {
    type Value = LayoutNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a concept id, a list of concept ids or a mapping of section names")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(LayoutNode::Selector(vec![v]))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let id = ConceptId::try_from(v).map_err(|_| E::custom(format!("concept id {v} out of range")))?;
        Ok(LayoutNode::Selector(vec![id]))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut ids = Vec::new();
        while let Some(id) = seq.next_element::<ConceptId>()? {
            ids.push(id);
        }
        Ok(LayoutNode::Selector(ids))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some((name, node)) = map.next_entry::<String, LayoutNode>()? {
            entries.push(LayoutEntry { name, node });
        }
        Ok(LayoutNode::Nested(entries))
    }
}

impl<'de> Deserialize<'de> for LayoutNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LayoutNodeVisitor)
    }
}

impl<'de> Deserialize<'de> for PageLayout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LayoutNode::deserialize(deserializer)? {
            LayoutNode::Nested(sections) => Ok(Self { sections }),
            LayoutNode::Selector(_) => Err(de::Error::custom(
                "page layout must be a mapping of section names",
            )),
        }
    }
}

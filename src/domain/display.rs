//! Display configuration: path directives that prune, style and rank the case tree.
//!
//! A directive path is a dot-separated list of node keys from a root section down
//! to the target, e.g. `BACKGROUND.Family History.Cancer: Yes`. Everything but the
//! last segment is the *parent path*; the last segment is the leaf text (or child
//! key) to keep under that parent. Matching is exact and case-sensitive.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::domain::layout::{BACKGROUND, PATIENT_DEMOGRAPHICS, PHYSICAL_EXAMINATION};
use crate::domain::tree::{NodeStyle, NodeValue, TreeNode};

pub const PATH_SEPARATOR: char = '.';

/// Root sections whose children are pruned. Other sections pass through untouched.
pub const PRUNED_SECTIONS: [&str; 2] = [BACKGROUND, PHYSICAL_EXAMINATION];

/// Style as written by the ingestion step.
///
/// `collapse` here means "hide"; it is inverted when merged onto a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<bool>,
    /// Non-numeric weights are dropped on read.
    #[serde(
        default,
        deserialize_with = "numeric_weight",
        skip_serializing_if = "Option::is_none"
    )]
    pub top: Option<f64>,
}

fn numeric_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(serde_json::Value::as_f64))
}

/// One persisted `{path, style}` directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfigEntry {
    pub path: String,
    #[serde(default)]
    pub style: EntryStyle,
}

impl DisplayConfigEntry {
    pub fn new(path: impl Into<String>, style: EntryStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }
}

/// Borrowed view of a directive path split into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> DisplayPath<'a> {
    pub fn parse(path: &'a str) -> Self {
        Self {
            segments: path.split(PATH_SEPARATOR).collect(),
        }
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Path of the targeted node's parent; `None` for root-level paths.
    pub fn parent(&self) -> Option<String> {
        match self.segments.len() {
            0 | 1 => None,
            n => Some(self.segments[..n - 1].join(PATH_SEPARATOR.encode_utf8(&mut [0; 4]))),
        }
    }

    pub fn leaf(&self) -> Option<&'a str> {
        self.segments.last().copied()
    }
}

/// Join a parent path and a child key.
pub fn join_path(parent: &str, key: &str) -> String {
    format!("{parent}{PATH_SEPARATOR}{key}")
}

/// Transient candidate for the important-info side list.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportantInfo {
    pub key: String,
    pub values: NodeValue,
    pub weight: f64,
}

/// Sort important infos by ascending weight and turn them into response nodes.
/// Equal weights keep their discovery order.
pub fn rank_important_infos(mut infos: Vec<ImportantInfo>) -> Vec<TreeNode> {
    infos.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    infos
        .into_iter()
        .map(|info| TreeNode::new(info.key, info.values))
        .collect()
}

#[derive(Debug, Default)]
struct DirectiveGroup {
    kept: HashSet<String>,
    style: NodeStyle,
}

impl DirectiveGroup {
    fn merge(&mut self, style: &EntryStyle) {
        if let Some(collapse) = style.collapse {
            self.style.collapse = Some(!collapse);
        }
        if let Some(highlight) = style.highlight {
            self.style.highlight = Some(highlight);
        }
        if let Some(top) = style.top {
            self.style.top = Some(self.style.top.map_or(top, |current| current.max(top)));
        }
    }
}

/// Applies one display configuration to a freshly built case tree.
#[derive(Debug, Default)]
pub struct DisplayConfigApplier {
    groups: HashMap<String, DirectiveGroup>,
}

impl DisplayConfigApplier {
    /// Group directives by parent path, folding their styles in entry order.
    pub fn new(entries: &[DisplayConfigEntry]) -> Self {
        let mut groups: HashMap<String, DirectiveGroup> = HashMap::new();
        for entry in entries {
            let path = DisplayPath::parse(&entry.path);
            let (Some(parent), Some(leaf)) = (path.parent(), path.leaf()) else {
                debug!("ignoring root-level directive '{}'", entry.path);
                continue;
            };
            let group = groups.entry(parent).or_default();
            group.kept.insert(leaf.to_string());
            group.merge(&entry.style);
        }
        Self { groups }
    }

    /// Prune and style the tree, collecting weighted nodes for the side list.
    ///
    /// Children of the pruned sections without any directive lose their content;
    /// children with directives keep only the targeted leaf text or child keys.
    pub fn apply(&self, mut tree: Vec<TreeNode>) -> (Vec<TreeNode>, Vec<ImportantInfo>) {
        let mut infos = Vec::new();

        for section in tree.iter_mut() {
            if !PRUNED_SECTIONS.contains(&section.key.as_str()) {
                continue;
            }
            let section_key = section.key.clone();
            let Some(children) = section.children_mut() else {
                continue;
            };

            for idx in 0..children.len() {
                let child = &mut children[idx];
                if child.key == PATIENT_DEMOGRAPHICS {
                    continue;
                }

                let parent_path = join_path(&section_key, &child.key);
                let Some(group) = self.groups.get(&parent_path) else {
                    child.value.clear();
                    continue;
                };

                child.value.retain(&group.kept);
                if let Some(weight) = group.style.top {
                    infos.push(ImportantInfo {
                        key: child.key.clone(),
                        values: child.value.clone(),
                        weight,
                    });
                }
                if !group.style.is_empty() {
                    child.style = Some(group.style.clone());
                }
            }
        }

        debug!("display config produced {} important infos", infos.len());
        (tree, infos)
    }
}

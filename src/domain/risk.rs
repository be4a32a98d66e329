//! Colorectal-cancer risk score rules.
//!
//! The score comes either from literal `RISK ASSESSMENT.<label>: N` directives in
//! the display configuration or, when the configuration only toggles the section
//! on, from a derived observation attached to the case.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::display::{DisplayConfigEntry, PATH_SEPARATOR};
use crate::domain::entities::ConceptId;
use crate::domain::error::DomainError;
use crate::domain::tree::TreeNode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// Root segment of risk directives; a bare directive with this path enables the fallback.
    pub section: String,
    pub score_label: String,
    pub adjusted_label: String,
    /// Label the adjusted risk is shown under.
    pub ai_label: String,
    pub derived_concept_id: ConceptId,
    /// Banding caption used as the key of the main risk node.
    pub caption: String,
    pub placeholder: String,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            section: "RISK ASSESSMENT".into(),
            score_label: "Colorectal Cancer Score".into(),
            adjusted_label: "Adjusted CRC Risk".into(),
            ai_label: "AI-Predicted CRC Risk Score".into(),
            derived_concept_id: 45614722,
            caption: "<6: Low; 6-11: Medium; >11: High".into(),
            placeholder: "N/A".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskRules {
    settings: RiskSettings,
    score: Regex,
}

impl RiskRules {
    pub fn new(settings: &RiskSettings) -> Result<Self, DomainError> {
        let pattern = format!(
            r"^\s*{}:\s*(?P<value>.*\S)\s*$",
            regex::escape(&settings.score_label)
        );
        let score = Regex::new(&pattern)
            .map_err(|e| DomainError::InvalidRiskLabel(format!("{}: {e}", settings.score_label)))?;
        Ok(Self {
            settings: settings.clone(),
            score,
        })
    }

    pub fn derived_concept_id(&self) -> ConceptId {
        self.settings.derived_concept_id
    }

    fn is_score(&self, text: &str) -> bool {
        self.score.is_match(text)
    }

    fn score_value<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.score
            .captures(text)
            .and_then(|c| c.name("value"))
            .map(|m| m.as_str())
    }

    /// Score literals of risk directives, in entry order.
    ///
    /// Everything after the section segment is the literal, so a decimal score
    /// such as `8.5` is not split at its point.
    pub fn literal_scores<'e>(&self, entries: &'e [DisplayConfigEntry]) -> Vec<&'e str> {
        let prefix = format!("{}{}", self.settings.section, PATH_SEPARATOR);
        entries
            .iter()
            .filter_map(|entry| entry.path.strip_prefix(prefix.as_str()))
            .filter(|literal| self.is_score(literal))
            .collect()
    }

    /// Whether the configuration carries the bare section directive.
    pub fn has_section_toggle(&self, entries: &[DisplayConfigEntry]) -> bool {
        entries.iter().any(|e| e.path == self.settings.section)
    }

    /// Nodes for literal scores; `None` when there are none.
    ///
    /// The first literal becomes the main node. Two or more numeric literals add
    /// min and max nodes.
    pub fn nodes_from_literals(&self, literals: &[&str]) -> Option<Vec<TreeNode>> {
        let first = literals.first()?;
        let mut nodes = vec![TreeNode::text(
            self.settings.caption.clone(),
            format!("Predicted {}", first.trim()),
        )];

        let numbers: Vec<f64> = literals
            .iter()
            .filter_map(|l| self.score_value(l))
            .filter_map(|v| v.parse::<f64>().ok())
            .collect();
        if numbers.len() >= 2 {
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            nodes.push(TreeNode::text(
                format!("Min Predicted {}", self.settings.score_label),
                min.to_string(),
            ));
            nodes.push(TreeNode::text(
                format!("Max Predicted {}", self.settings.score_label),
                max.to_string(),
            ));
        }
        Some(nodes)
    }

    /// Main node from derived observation texts: a score string wins over an
    /// adjusted risk, which wins over the placeholder.
    pub fn node_from_derived<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> TreeNode {
        let values: Vec<&str> = values.into_iter().collect();
        let adjusted_prefix = format!("{}:", self.settings.adjusted_label);

        let text = values
            .iter()
            .find(|v| self.is_score(v))
            .map(|v| v.trim().to_string())
            .or_else(|| {
                values.iter().find_map(|v| {
                    v.trim()
                        .strip_prefix(&adjusted_prefix)
                        .map(|rest| format!("{}: {}", self.settings.ai_label, rest.trim()))
                })
            })
            .unwrap_or_else(|| self.settings.placeholder.clone());

        TreeNode::text(self.settings.caption.clone(), text)
    }

    pub fn placeholder_node(&self) -> TreeNode {
        TreeNode::text(self.settings.caption.clone(), self.settings.placeholder.clone())
    }
}

//! Risk score resolver
//!
//! Produces the risk-assessment nodes appended after the ranked important infos.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, FetchResultExt};
use crate::domain::{CaseId, DisplayConfigEntry, RiskRules, TreeNode};
use crate::infrastructure::traits::ClinicalFactSource;

pub struct RiskScoreResolver {
    facts: Arc<dyn ClinicalFactSource>,
    rules: RiskRules,
}

impl RiskScoreResolver {
    pub fn new(facts: Arc<dyn ClinicalFactSource>, rules: RiskRules) -> Self {
        Self { facts, rules }
    }

    /// Risk nodes for a case under a display configuration; never empty.
    ///
    /// Literal scores in the configuration win. The derived observation is only
    /// consulted when the configuration toggles the risk section on.
    #[instrument(level = "debug", skip(self, entries))]
    pub fn resolve(
        &self,
        case_id: CaseId,
        entries: &[DisplayConfigEntry],
    ) -> ApplicationResult<Vec<TreeNode>> {
        let literals = self.rules.literal_scores(entries);
        if let Some(nodes) = self.rules.nodes_from_literals(&literals) {
            debug!("using {} literal risk scores", literals.len());
            return Ok(nodes);
        }

        if !self.rules.has_section_toggle(entries) {
            return Ok(vec![self.rules.placeholder_node()]);
        }

        let concept_id = self.rules.derived_concept_id();
        let rows = self
            .facts
            .observations_by_concept(case_id, &[concept_id])
            .with_fetch_context("derived risk observations of case", case_id)?;
        debug!("falling back to {} derived risk observations", rows.len());

        Ok(vec![self
            .rules
            .node_from_derived(rows.iter().filter_map(|o| o.value_as_string.as_deref()))])
    }
}

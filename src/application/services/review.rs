//! Case review service
//!
//! Entry point for reviewers: checks ownership of the display configuration,
//! then builds, prunes and ranks the case.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::services::{CaseTreeBuilder, RiskScoreResolver};
use crate::application::{ApplicationError, ApplicationResult, FetchResultExt};
use crate::domain::{
    rank_important_infos, CaseReview, CaseSummary, DisplayConfig, DisplayConfigApplier,
};
use crate::infrastructure::traits::DisplayConfigStore;

pub struct CaseReviewService {
    configs: Arc<dyn DisplayConfigStore>,
    trees: Arc<CaseTreeBuilder>,
    risk: RiskScoreResolver,
}

impl CaseReviewService {
    pub fn new(
        configs: Arc<dyn DisplayConfigStore>,
        trees: Arc<CaseTreeBuilder>,
        risk: RiskScoreResolver,
    ) -> Self {
        Self {
            configs,
            trees,
            risk,
        }
    }

    /// Assemble the review of the case a display configuration points to.
    ///
    /// Fails with [`ApplicationError::Access`] before touching any case data when
    /// the configuration is missing or owned by someone else.
    #[instrument(level = "debug", skip(self))]
    pub fn review_case(
        &self,
        config_id: &str,
        requesting_user_id: &str,
    ) -> ApplicationResult<CaseReview> {
        let config = self.owned_config(config_id, requesting_user_id)?;

        let tree = self.trees.build(config.case_id)?;
        let (details, infos) = DisplayConfigApplier::new(&config.entries).apply(tree.sections);

        let mut important_infos = rank_important_infos(infos);
        important_infos.extend(self.risk.resolve(config.case_id, &config.entries)?);

        info!(
            "reviewed case {} with config {}: {} sections, {} important infos",
            config.case_id,
            config.id,
            details.len(),
            important_infos.len()
        );
        Ok(CaseReview {
            person_label: tree.person.person_label,
            case_number: config.case_id.to_string(),
            details,
            important_infos,
        })
    }

    /// One summary per display configuration the user owns.
    #[instrument(level = "debug", skip(self))]
    pub fn case_summaries(&self, user_id: &str) -> ApplicationResult<Vec<CaseSummary>> {
        let configs = self
            .configs
            .display_configs_by_owner(user_id)
            .with_fetch_context("display configurations of user", user_id)?;

        configs
            .into_iter()
            .map(|config| {
                let headline = self.trees.headline(config.case_id)?;
                Ok(CaseSummary {
                    config_id: config.id,
                    case_id: config.case_id,
                    patient_chief_complaint: headline.chief_complaint,
                    age: headline.age,
                    gender: headline.gender,
                })
            })
            .collect()
    }

    fn owned_config(&self, config_id: &str, user_id: &str) -> ApplicationResult<DisplayConfig> {
        let config = self
            .configs
            .display_config_by_id(config_id)
            .with_fetch_context("display configuration", config_id)?;
        match config {
            Some(config) if config.owner_user_id == user_id => Ok(config),
            Some(_) => {
                warn!("user {} does not own display configuration {}", user_id, config_id);
                Err(ApplicationError::Access {
                    config_id: config_id.to_string(),
                })
            }
            None => {
                warn!("display configuration {} not found", config_id);
                Err(ApplicationError::Access {
                    config_id: config_id.to_string(),
                })
            }
        }
    }
}

//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{CaseReviewService, CaseTreeBuilder, RiskScoreResolver};
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::domain::{PageLayout, RiskRules};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::snapshot::load_snapshot;
use crate::infrastructure::traits::{
    ClinicalFactSource, ConceptNameResolver, DisplayConfigStore, FileSystem, RealFileSystem,
};

/// Container holding all application services.
pub struct ServiceContainer {
    pub trees: Arc<CaseTreeBuilder>,
    pub review: CaseReviewService,
}

impl ServiceContainer {
    /// Create a container backed by the configured snapshot.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(load_snapshot(fs.as_ref(), &settings.snapshot_path)?);
        Self::with_deps(settings, fs, store.clone(), store.clone(), store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        concepts: Arc<dyn ConceptNameResolver>,
        facts: Arc<dyn ClinicalFactSource>,
        configs: Arc<dyn DisplayConfigStore>,
    ) -> InfraResult<Self> {
        let layout = Arc::new(load_layout(fs.as_ref(), settings.layout_path.as_deref())?);
        let rules = RiskRules::new(&settings.risk).map_err(ApplicationError::from)?;

        let trees = Arc::new(CaseTreeBuilder::new(concepts, facts.clone(), layout));
        let risk = RiskScoreResolver::new(facts, rules);
        let review = CaseReviewService::new(configs, trees.clone(), risk);

        Ok(Self { trees, review })
    }
}

/// Read a layout file, or fall back to the reference layout.
pub fn load_layout(fs: &dyn FileSystem, path: Option<&Path>) -> InfraResult<PageLayout> {
    let Some(path) = path else {
        return Ok(PageLayout::reference());
    };
    debug!("loading page layout from {}", path.display());
    let content = fs
        .read_to_string(path)
        .map_err(|e| InfraError::io(format!("reading layout {}", path.display()), e))?;
    PageLayout::from_json(&content)
        .map_err(|e| InfraError::Application(ApplicationError::Domain(e)))
}

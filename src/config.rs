//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/casereview/casereview.toml`
//! 3. Explicit config file passed on the command line
//! 4. Environment variables: `CASEREVIEW_*` prefix, `__` between nested keys

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::RiskSettings;

/// Unified configuration for casereview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// JSON fact snapshot read by the CLI (default: ~/.casereview/snapshot.json)
    pub snapshot_path: PathBuf,
    /// JSON page layout; the built-in reference layout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_path: Option<PathBuf>,
    /// Risk assessment labels and the derived concept
    pub risk: RiskSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_path: default_base_dir().join("snapshot.json"),
            layout_path: None,
            risk: RiskSettings::default(),
        }
    }
}

/// Get the default base directory (~/.casereview).
fn default_base_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".casereview"))
        .unwrap_or_else(|| PathBuf::from("~/.casereview"))
}

/// Get the XDG config directory for casereview.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "casereview").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("casereview.toml"))
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `explicit` must exist when given; the global file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(global_config_path().as_deref(), explicit, true)
    }

    fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        with_env: bool,
    ) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default(
                "snapshot_path",
                defaults.snapshot_path.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default("risk.section", defaults.risk.section.clone())
            .map_err(config_err)?
            .set_default("risk.score_label", defaults.risk.score_label.clone())
            .map_err(config_err)?
            .set_default("risk.adjusted_label", defaults.risk.adjusted_label.clone())
            .map_err(config_err)?
            .set_default("risk.ai_label", defaults.risk.ai_label.clone())
            .map_err(config_err)?
            .set_default("risk.derived_concept_id", defaults.risk.derived_concept_id)
            .map_err(config_err)?
            .set_default("risk.caption", defaults.risk.caption.clone())
            .map_err(config_err)?
            .set_default("risk.placeholder", defaults.risk.placeholder.clone())
            .map_err(config_err)?;

        if let Some(global) = global.filter(|p| p.exists()) {
            debug!("global config: {}", global.display());
            builder = builder.add_source(File::from(global).format(FileFormat::Toml).required(false));
        }
        if let Some(explicit) = explicit {
            if !explicit.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", explicit.display()),
                });
            }
            debug!("explicit config: {}", explicit.display());
            builder = builder.add_source(File::from(explicit).format(FileFormat::Toml).required(true));
        }
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix("CASEREVIEW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.expand_paths();
        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path fields.
    fn expand_paths(&mut self) {
        self.snapshot_path = expand(&self.snapshot_path);
        self.layout_path = self.layout_path.as_deref().map(expand);
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# casereview configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/casereview/casereview.toml
#   Explicit: casereview --config <file>
#   Env:      CASEREVIEW_* environment variables, e.g. CASEREVIEW_RISK__CAPTION

# JSON snapshot with concepts, visits, persons, facts and display configurations
# snapshot_path = "~/.casereview/snapshot.json"

# JSON page layout overriding the built-in one
# layout_path = "~/.casereview/layout.json"

[risk]
# Root segment of risk directives; a bare "RISK ASSESSMENT" entry enables the fallback
# section = "RISK ASSESSMENT"

# Label of literal scores, e.g. "RISK ASSESSMENT.Colorectal Cancer Score: 8"
# score_label = "Colorectal Cancer Score"

# Derived observation label and the label it is shown under
# adjusted_label = "Adjusted CRC Risk"
# ai_label = "AI-Predicted CRC Risk Score"

# Concept id of the derived risk observation
# derived_concept_id = 45614722

# Key of the risk node
# caption = "<6: Low; 6-11: Medium; >11: High"

# Shown when no score is available
# placeholder = "N/A"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

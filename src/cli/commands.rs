//! Command dispatch
//!
//! Loads settings, wires the service container and renders results.

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::CaseId;
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `casereview --help`".into(),
        ));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = load_settings(cli)?;
    match command {
        Commands::Config { command } => cmd_config(&settings, command, cli),
        Commands::Review {
            config_id,
            user,
            json,
        } => cmd_review(&container(settings)?, config_id, user, *json),
        Commands::Tree { case_id, json } => cmd_tree(&container(settings)?, *case_id, *json),
        Commands::Cases { user, json } => cmd_cases(&container(settings)?, user, *json),
        Commands::Layout => cmd_layout(&container(settings)?),
        Commands::Completion { .. } => Ok(()),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(snapshot) = &cli.snapshot {
        settings.snapshot_path = snapshot.clone();
    }
    debug!("snapshot: {}", settings.snapshot_path.display());
    Ok(settings)
}

fn container(settings: Settings) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(settings)?)
}

#[instrument(skip(container))]
fn cmd_review(container: &ServiceContainer, config_id: &str, user: &str, json: bool) -> CliResult<()> {
    let review = container.review.review_case(config_id, user)?;
    if json {
        output::info(&serde_json::to_string_pretty(&review)?);
        return Ok(());
    }

    output::header(&format!(
        "{} (case {})",
        review.person_label, review.case_number
    ));
    output::info(&output::render_tree("Details", &review.details));
    output::info(&output::render_tree("Important", &review.important_infos));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, case_id: CaseId, json: bool) -> CliResult<()> {
    let tree = container.trees.build(case_id)?;
    if json {
        output::info(&serde_json::to_string_pretty(&tree.sections)?);
        return Ok(());
    }
    output::info(&output::render_tree(
        &format!("{} (case {})", tree.person.person_label, case_id),
        &tree.sections,
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_cases(container: &ServiceContainer, user: &str, json: bool) -> CliResult<()> {
    let summaries = container.review.case_summaries(user)?;
    if json {
        output::info(&serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        output::warning(&format!("no cases for {user}"));
        return Ok(());
    }

    output::header(&format!("Cases of {user}"));
    for s in &summaries {
        output::detail(&format!(
            "{}  case {}  {} {}  {}",
            s.config_id,
            s.case_id,
            s.age,
            s.gender,
            s.patient_chief_complaint.as_deref().unwrap_or("-")
        ));
    }
    Ok(())
}

fn cmd_layout(container: &ServiceContainer) -> CliResult<()> {
    output::info(&serde_json::to_string_pretty(container.trees.layout())?);
    Ok(())
}

fn cmd_config(settings: &Settings, command: &ConfigCommands, cli: &Cli) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no config directory)".into());
            output::action("Global", &global);
            if let Some(explicit) = &cli.config {
                output::action("Explicit", &explicit.display());
            }
            output::action("Snapshot", &settings.snapshot_path.display());
            if let Some(layout) = &settings.layout_path {
                output::action("Layout", &layout.display());
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

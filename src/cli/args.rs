//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::CaseId;

/// Case review trees: build, prune and rank de-identified clinical cases
#[derive(Parser, Debug)]
#[command(name = "casereview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more detail (-d, -dd, -ddd)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Fact snapshot (overrides snapshot_path)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review the case behind a display configuration
    Review {
        /// Display configuration id
        config_id: String,
        /// Requesting user; must own the configuration
        #[arg(short, long)]
        user: String,
        /// Print the review as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the unpruned tree of a case
    Tree {
        /// Case (visit) id
        case_id: CaseId,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the cases a user reviews
    Cases {
        /// Reviewer id
        #[arg(short, long)]
        user: String,
        /// Print the summaries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective page layout as JSON
    Layout,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}

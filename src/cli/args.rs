//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::MovePosition;

/// Placement rules for page templates: unique, first-level-only, no-children and max depth
#[derive(Parser, Debug)]
#[command(name = "pagebounds")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Site file, overrides the configured `site_file`
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub site: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every page against the template rules
    Audit,

    /// List templates selectable for a page
    Templates {
        /// Page the new page would be created under
        #[arg(long)]
        parent: Option<String>,
        /// Existing page being edited
        #[arg(long)]
        page: Option<String>,
    },

    /// Add a page
    Add {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        /// Template key
        #[arg(long)]
        template: String,
        /// Parent page slug
        #[arg(long)]
        parent: Option<String>,
        /// Write the result back to the site file
        #[arg(long)]
        save: bool,
    },

    /// Move a page relative to another page
    Move {
        /// Slug of the page to move
        page: String,
        /// Slug of the page it is dropped on
        target: String,
        /// first-child, last-child, left or right
        #[arg(long, default_value = "last-child")]
        position: MovePosition,
        /// Write the result back to the site file
        #[arg(long)]
        save: bool,
    },

    /// Show the page tree
    Tree,

    /// Show the actions available for a page
    Actions {
        /// Page slug
        page: String,
    },

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

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

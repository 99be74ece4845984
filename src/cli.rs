//! Command-line interface definition
//!
//! The top-level parser carries the global repository options shared by
//! every subcommand; each repository operation is one subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::repository::RepositoryConfig;

/// Command-line interface for the simulation repository tool
#[derive(Parser)]
#[command(name = "sim_repo")]
#[command(about = "Inventory, catalog and audit simulation repositories created with ESM-Tools")]
#[command(version)]
pub struct Cli {
    /// Repository base directory (falls back to ESM_SIM_REPO_BASE_DIR,
    /// then the built-in default)
    #[arg(long = "base-dir", global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Exclude an experiment ID from scanning; repeatable (falls back to
    /// ESM_SIM_REPO_BLACK_LIST, colon separated)
    #[arg(long = "black-list", global = true, value_name = "EXPID")]
    pub black_list: Vec<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Scan configuration from the global options
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            base_dir: self.base_dir.clone(),
            black_list: if self.black_list.is_empty() {
                None
            } else {
                Some(self.black_list.clone())
            },
        }
    }
}

/// Available commands for the simulation repository tool
#[derive(Subcommand)]
pub enum Commands {
    /// List the experiments found in the repository
    List {
        /// Only show experiments of this kind ('cosmos' or 'uncategorized')
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Show one experiment in detail
    Show {
        /// Experiment ID
        expid: String,
    },

    /// Print an experiment's parsed parameter file as JSON
    Params {
        /// Experiment ID
        expid: String,
    },

    /// Print the COSMOS catalog as JSON
    Catalog {
        /// Restrict the catalog to one experiment ID
        expid: Option<String>,
    },

    /// Check the repository against the layout rules
    Check,

    /// Print repository totals
    Summary {
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export the experiment inventory to a file
    Export {
        /// Export format: 'csv' or 'json'
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Directory to write into (defaults to the downloads folder)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Watch the repository for new and changed experiments
    Watch {
        /// Seconds between full rescans
        #[arg(short, long, default_value = "30")]
        interval: u64,
    },
}

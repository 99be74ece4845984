//! Experiment data types
//!
//! An experiment is one directory under the repository base directory. By
//! convention it carries `executable/`, `input/`, `output/` and `scripts/`
//! sub-folders; experiments that also carry a `${EXPID}.parameters` file are
//! classified by their `complexity` parameter.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::catalog::{build_stream_entries, CatalogEntry};
use crate::parser::params::{parse_file, Parameters};
use crate::repository::RepositoryError;
use crate::CommandError;

/// Sub-folders every repository experiment is expected to provide
pub const STANDARD_DIRS: [&str; 4] = ["executable", "input", "output", "scripts"];

/// Derive an experiment ID from its directory path.
///
/// The ID is the directory basename; trailing separators are ignored.
pub fn expid_from_dir(dir: &Path) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Model family of an experiment, derived from its `complexity` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentKind {
    /// COSMOS (ECHAM5 + JSBACH) experiments
    Cosmos,
    /// Experiments without a parameter file
    Uncategorized,
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentKind::Cosmos => write!(f, "cosmos"),
            ExperimentKind::Uncategorized => write!(f, "uncategorized"),
        }
    }
}

impl FromStr for ExperimentKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosmos" => Ok(ExperimentKind::Cosmos),
            "uncategorized" => Ok(ExperimentKind::Uncategorized),
            other => Err(CommandError::Internal(format!(
                "Invalid experiment kind: {}. Use 'cosmos' or 'uncategorized'",
                other
            ))),
        }
    }
}

/// A generic experiment in the simulation repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoExperiment {
    /// Experiment ID, normally the directory basename
    pub expid: String,
    /// Directory holding this experiment
    pub base_dir: PathBuf,
}

impl RepoExperiment {
    /// Create an experiment rooted at `base_dir`
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        let base_dir = base_dir.into();
        let expid = expid_from_dir(&base_dir);
        Self { expid, base_dir }
    }

    /// Replace the derived experiment ID
    pub fn with_expid(mut self, expid: impl Into<String>) -> Self {
        self.expid = expid.into();
        self
    }

    pub fn executable_dir(&self) -> PathBuf {
        self.base_dir.join("executable")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.base_dir.join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join("output")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.base_dir.join("scripts")
    }

    /// Path of this experiment's `${EXPID}.parameters` file
    pub fn parameter_file(&self) -> PathBuf {
        self.base_dir.join(format!("{}.parameters", self.expid))
    }
}

/// A COSMOS experiment with its parsed parameters and output catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosExperiment {
    pub experiment: RepoExperiment,
    /// Contents of the parameter file
    pub params: Parameters,
    /// Output files as recorded on the original compute host
    pub original_output: Vec<String>,
    /// One catalog entry per known output stream
    pub entries: Vec<CatalogEntry>,
}

impl CosmosExperiment {
    /// Build a COSMOS experiment from already-parsed parameters.
    ///
    /// The recorded `output` paths are rebased onto the experiment's own
    /// `output/` folder and grouped into per-stream catalog entries.
    pub fn from_params(
        experiment: RepoExperiment,
        params: Parameters,
    ) -> Result<Self, RepositoryError> {
        let original_output: Vec<String> = params
            .get("output")
            .ok_or_else(|| RepositoryError::MissingParameter {
                expid: experiment.expid.clone(),
                key: "output".to_string(),
            })?
            .values()
            .to_vec();
        let entries = build_stream_entries(&experiment, &original_output);
        Ok(Self {
            experiment,
            params,
            original_output,
            entries,
        })
    }

    /// Open an experiment directory, parsing its parameter file from disk
    pub fn open<P: Into<PathBuf>>(base_dir: P) -> Result<Self, RepositoryError> {
        let experiment = RepoExperiment::new(base_dir);
        let params = parse_file(experiment.parameter_file())?;
        Self::from_params(experiment, params)
    }

    pub fn expid(&self) -> &str {
        &self.experiment.expid
    }

    /// Catalog entry for one stream name, if known
    pub fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Total number of catalog files across all streams
    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.args.urlpath.len()).sum()
    }
}

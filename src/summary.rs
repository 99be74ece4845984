//! Repository summaries
//!
//! Flat per-experiment and whole-repository aggregates, shared by the
//! `list` and `summary` commands and the inventory exporters.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::experiment::{CosmosExperiment, ExperimentKind, RepoExperiment};
use crate::repository::SimulationRepository;

/// Flat description of one experiment
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub expid: String,
    pub kind: ExperimentKind,
    pub base_dir: PathBuf,
    pub has_params: bool,
    /// Distinct keys in the parameter file
    pub param_count: usize,
    /// Streams with at least one cataloged file
    pub stream_count: usize,
    /// Cataloged files across all streams
    pub file_count: usize,
}

impl ExperimentSummary {
    pub fn from_cosmos(experiment: &CosmosExperiment) -> Self {
        Self {
            expid: experiment.expid().to_string(),
            kind: ExperimentKind::Cosmos,
            base_dir: experiment.experiment.base_dir.clone(),
            has_params: true,
            param_count: experiment.params.len(),
            stream_count: experiment
                .entries
                .iter()
                .filter(|entry| !entry.args.urlpath.is_empty())
                .count(),
            file_count: experiment.file_count(),
        }
    }

    pub fn from_uncategorized(experiment: &RepoExperiment) -> Self {
        Self {
            expid: experiment.expid.clone(),
            kind: ExperimentKind::Uncategorized,
            base_dir: experiment.base_dir.clone(),
            has_params: false,
            param_count: 0,
            stream_count: 0,
            file_count: 0,
        }
    }
}

/// Whole-repository aggregate
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySummary {
    pub base_dir: PathBuf,
    pub scanned_at: String,
    pub total_experiments: usize,
    pub cosmos_experiments: usize,
    pub uncategorized_experiments: usize,
    pub blacklisted: usize,
    pub total_catalog_files: usize,
}

impl RepositorySummary {
    pub fn from_repository(repo: &SimulationRepository) -> Self {
        Self {
            base_dir: repo.base_dir.clone(),
            scanned_at: repo.scanned_at.clone(),
            total_experiments: repo.total(),
            cosmos_experiments: repo.cosmos.len(),
            uncategorized_experiments: repo.experiments.len(),
            blacklisted: repo.black_list.len(),
            total_catalog_files: repo.cosmos.file_count(),
        }
    }
}

impl fmt::Display for RepositorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository:    {}", self.base_dir.display())?;
        writeln!(f, "Scanned at:    {}", self.scanned_at)?;
        writeln!(
            f,
            "Experiments:   {} ({} COSMOS, {} uncategorized)",
            self.total_experiments, self.cosmos_experiments, self.uncategorized_experiments
        )?;
        writeln!(f, "Blacklisted:   {}", self.blacklisted)?;
        write!(f, "Catalog files: {}", self.total_catalog_files)
    }
}

/// Summaries for every experiment in the repository, sorted by ID
pub fn experiment_summaries(repo: &SimulationRepository) -> Vec<ExperimentSummary> {
    let mut rows: Vec<ExperimentSummary> = repo
        .cosmos
        .iter()
        .map(ExperimentSummary::from_cosmos)
        .chain(repo.experiments.iter().map(ExperimentSummary::from_uncategorized))
        .collect();
    rows.sort_by(|a, b| a.expid.cmp(&b.expid));
    rows
}

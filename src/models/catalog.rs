//! Intake-style catalog types
//!
//! COSMOS experiments publish their monthly output as catalog entries
//! modelled on an intake NetCDF source: a driver name, a description, a
//! direct-access flag, and loader arguments (file list plus xarray keyword
//! arguments). The file lists are rebased from the original compute host
//! onto the experiment's own `output/` folder.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::experiment::{CosmosExperiment, RepoExperiment};

/// Monthly output stream tags recorded for COSMOS experiments
pub const COSMOS_STREAM_TAGS: [&str; 7] = [
    "echam5_main_mm",
    "echam5_wiso_mm",
    "echam5_co2_mm",
    "jsbach_veg_mm",
    "jsbach_land_mm",
    "jsbach_main_mm",
    "jsbach_surf_mm",
];

/// Default name of the aggregated COSMOS catalog
pub const DEFAULT_CATALOG_NAME: &str = "cosmos_exps";

/// Default description of the aggregated COSMOS catalog
pub const DEFAULT_CATALOG_DESCRIPTION: &str =
    "COSMOS Experiments in the AWI Paleoclimate Dynamics Repository";

/// Keyword arguments handed to xarray when an entry is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XarrayKwargs {
    pub decode_times: bool,
    pub combine: String,
    pub parallel: bool,
}

impl Default for XarrayKwargs {
    fn default() -> Self {
        Self {
            decode_times: false,
            combine: "nested".to_string(),
            parallel: true,
        }
    }
}

/// Loader arguments of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryArgs {
    pub urlpath: Vec<PathBuf>,
    pub xarray_kwargs: XarrayKwargs,
}

/// One data source in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream name, the tag with its `_mm` suffix dropped
    pub name: String,
    pub description: String,
    pub driver: String,
    pub direct_access: bool,
    pub args: EntryArgs,
}

impl CatalogEntry {
    /// Number of files this entry points at
    pub fn file_count(&self) -> usize {
        self.args.urlpath.len()
    }
}

/// Build the per-stream catalog entries for one experiment.
///
/// A recorded output file belongs to a stream when its original path
/// contains `{expid}_{tag}`; matching files keep only their basename and
/// are rebased onto the experiment's `output/` folder. Every known stream
/// gets an entry, even when no files match.
pub fn build_stream_entries(
    experiment: &RepoExperiment,
    original_output: &[String],
) -> Vec<CatalogEntry> {
    let output_dir = experiment.output_dir();
    COSMOS_STREAM_TAGS
        .iter()
        .map(|tag| {
            tracing::debug!("Setting up: {}", tag);
            let needle = format!("{}_{}", experiment.expid, tag);
            let urlpath: Vec<PathBuf> = original_output
                .iter()
                .filter(|file| file.contains(&needle))
                .filter_map(|file| {
                    Path::new(file)
                        .file_name()
                        .map(|name| output_dir.join(name))
                })
                .collect();
            let name = tag.replace("_mm", "");
            let description = format!("{} files", name.replace('_', " "));
            CatalogEntry {
                name,
                description,
                driver: "netcdf".to_string(),
                direct_access: true,
                args: EntryArgs {
                    urlpath,
                    xarray_kwargs: XarrayKwargs::default(),
                },
            }
        })
        .collect()
}

/// Aggregated catalog over every COSMOS experiment in a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosCatalog {
    pub name: String,
    pub description: String,
    /// Experiments keyed by their ID, in scan order
    pub entries: IndexMap<String, CosmosExperiment>,
}

impl CosmosCatalog {
    /// Build a catalog with the default name and description
    pub fn new(experiments: Vec<CosmosExperiment>) -> Self {
        Self::with_name(DEFAULT_CATALOG_NAME, DEFAULT_CATALOG_DESCRIPTION, experiments)
    }

    /// Build a catalog with an explicit name and description
    pub fn with_name(
        name: impl Into<String>,
        description: impl Into<String>,
        experiments: Vec<CosmosExperiment>,
    ) -> Self {
        let mut entries = IndexMap::new();
        for experiment in experiments {
            entries.insert(experiment.expid().to_string(), experiment);
        }
        Self {
            name: name.into(),
            description: description.into(),
            entries,
        }
    }

    /// Look up one experiment by ID
    pub fn get(&self, expid: &str) -> Option<&CosmosExperiment> {
        self.entries.get(expid)
    }

    /// Iterate over the experiments in scan order
    pub fn iter(&self) -> impl Iterator<Item = &CosmosExperiment> {
        self.entries.values()
    }

    /// Number of experiments in the catalog
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of catalog files across all experiments
    pub fn file_count(&self) -> usize {
        self.iter().map(CosmosExperiment::file_count).sum()
    }
}

impl fmt::Display for CosmosCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with {} experiments", self.name, self.len())
    }
}

//! Simulation repository scanning
//!
//! A repository is one base directory in which every sub-directory is an
//! experiment. Scanning walks the base directory, applies the blacklist,
//! parses each experiment's parameter file, and sorts the results into the
//! COSMOS catalog or the uncategorized list. Parsed experiments are cached
//! by parameter-file metadata so repeated scans stay cheap.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Instant, SystemTime};

use lazy_static::lazy_static;
use serde::Serialize;
use thiserror::Error;

use crate::models::catalog::CosmosCatalog;
use crate::models::experiment::{expid_from_dir, CosmosExperiment, ExperimentKind, RepoExperiment};
use crate::parser::params::parse_file;
use crate::parser::{Parameters, ParserError};

/// Base directory scanned when neither the argument nor the environment
/// provides one
pub const DEFAULT_BASE_DIR: &str = "/scratch/simulation_database/incoming/";

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "ESM_SIM_REPO_BASE_DIR";

/// Environment variable holding a colon-separated experiment blacklist
pub const BLACK_LIST_ENV: &str = "ESM_SIM_REPO_BLACK_LIST";

/// Errors that can occur while scanning a repository
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parameter file error: {0}")]
    Parser(#[from] ParserError),

    #[error("Base directory not found: {0}")]
    BaseDirNotFound(PathBuf),

    #[error("No complexity defined for experiment {expid}")]
    MissingComplexity { expid: String },

    #[error("Unsupported complexity '{complexity}' for experiment {expid}")]
    UnsupportedComplexity { expid: String, complexity: String },

    #[error("Missing parameter '{key}' for experiment {expid}")]
    MissingParameter { expid: String, key: String },
}

/// Scan configuration, resolved with argument > environment > default
/// precedence
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    /// Explicit base directory, overriding `ESM_SIM_REPO_BASE_DIR`
    pub base_dir: Option<PathBuf>,
    /// Explicit blacklist, overriding `ESM_SIM_REPO_BLACK_LIST`
    pub black_list: Option<Vec<String>>,
}

impl RepositoryConfig {
    /// Resolve the effective base directory and blacklist
    pub fn resolve(&self) -> (PathBuf, Vec<String>) {
        let base_dir = self.base_dir.clone().unwrap_or_else(|| {
            std::env::var(BASE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_BASE_DIR))
        });
        let black_list = self.black_list.clone().unwrap_or_else(|| {
            std::env::var(BLACK_LIST_ENV)
                .unwrap_or_default()
                .split(':')
                .filter(|item| !item.is_empty())
                .map(|item| item.to_string())
                .collect()
        });
        (base_dir, black_list)
    }
}

/// Classify parsed parameters by their `complexity` value.
///
/// Any complexity value containing `cosmos` marks a COSMOS experiment;
/// everything else is rejected.
pub fn classify(expid: &str, params: &Parameters) -> Result<ExperimentKind, RepositoryError> {
    let complexity = params
        .get("complexity")
        .ok_or_else(|| RepositoryError::MissingComplexity {
            expid: expid.to_string(),
        })?;
    if complexity.values().iter().any(|value| value.contains("cosmos")) {
        Ok(ExperimentKind::Cosmos)
    } else {
        Err(RepositoryError::UnsupportedComplexity {
            expid: expid.to_string(),
            complexity: complexity.values().join(","),
        })
    }
}

/// Cached experiment keyed by parameter-file metadata
struct CachedExperiment {
    last_modified: SystemTime,
    file_size: u64,
    experiment: CosmosExperiment,
    last_accessed: Instant,
}

lazy_static! {
    static ref SCAN_CACHE: RwLock<HashMap<PathBuf, CachedExperiment>> =
        RwLock::new(HashMap::new());
}

fn get_cached_experiment(
    param_file: &Path,
    modified: SystemTime,
    size: u64,
) -> Option<CosmosExperiment> {
    let cache = SCAN_CACHE.read().ok()?;
    let cached = cache.get(param_file)?;
    if cached.last_modified == modified && cached.file_size == size {
        Some(cached.experiment.clone())
    } else {
        None
    }
}

fn cache_experiment(
    param_file: &Path,
    modified: SystemTime,
    size: u64,
    experiment: &CosmosExperiment,
) {
    if let Ok(mut cache) = SCAN_CACHE.write() {
        // Limit cache size to avoid memory issues
        if cache.len() > 500 {
            // Evict oldest 50 entries by last_accessed
            let mut entries: Vec<(PathBuf, Instant)> = cache
                .iter()
                .map(|(k, v)| (k.clone(), v.last_accessed))
                .collect();
            entries.sort_by_key(|(_, t)| *t);
            for (key, _) in entries.into_iter().take(50) {
                cache.remove(&key);
            }
        }

        cache.insert(
            param_file.to_path_buf(),
            CachedExperiment {
                last_modified: modified,
                file_size: size,
                experiment: experiment.clone(),
                last_accessed: Instant::now(),
            },
        );
    }
}

/// Drop every cached scan result
pub fn clear_scan_cache() {
    if let Ok(mut cache) = SCAN_CACHE.write() {
        cache.clear();
    }
}

fn load_cosmos(folder: &Path, param_file: &Path) -> Result<CosmosExperiment, RepositoryError> {
    let metadata = fs::metadata(param_file)?;
    let modified = metadata.modified()?;
    let size = metadata.len();

    if let Some(cached) = get_cached_experiment(param_file, modified, size) {
        tracing::debug!("Using cached experiment for {:?}", param_file);
        return Ok(cached);
    }

    let params = parse_file(param_file)?;
    classify(&expid_from_dir(folder), &params)?;
    let experiment = CosmosExperiment::from_params(RepoExperiment::new(folder), params)?;
    cache_experiment(param_file, modified, size, &experiment);
    Ok(experiment)
}

/// A reference to either kind of scanned experiment
#[derive(Debug, Clone, Copy)]
pub enum ExperimentRef<'a> {
    Cosmos(&'a CosmosExperiment),
    Uncategorized(&'a RepoExperiment),
}

/// A scanned simulation repository
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRepository {
    pub base_dir: PathBuf,
    pub black_list: Vec<String>,
    /// Experiments without a parameter file
    pub experiments: Vec<RepoExperiment>,
    /// Every COSMOS experiment, aggregated into one catalog
    pub cosmos: CosmosCatalog,
    /// When the scan ran, RFC 3339
    pub scanned_at: String,
}

impl SimulationRepository {
    /// Scan the repository, classifying every directory under the base dir.
    ///
    /// Directories are visited in name order, so results are deterministic.
    /// A parameter file that fails to parse or classify aborts the scan;
    /// the audit module is the lenient counterpart.
    pub fn scan(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        let (base_dir, black_list) = config.resolve();
        tracing::debug!("Looking at {:?}", base_dir);

        if !base_dir.is_dir() {
            return Err(RepositoryError::BaseDirNotFound(base_dir));
        }

        let mut folders: Vec<PathBuf> = fs::read_dir(&base_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect();
        folders.sort();

        let mut experiments = Vec::new();
        let mut cosmos_experiments = Vec::new();

        for folder in folders {
            if !folder.is_dir() {
                continue;
            }
            let expid = expid_from_dir(&folder);
            if black_list.contains(&expid) {
                tracing::debug!("Skipping blacklisted experiment {}", expid);
                continue;
            }
            tracing::debug!("Checking for: {:?}", folder);
            let param_file = folder.join(format!("{}.parameters", expid));
            if param_file.is_file() {
                cosmos_experiments.push(load_cosmos(&folder, &param_file)?);
            } else {
                experiments.push(RepoExperiment::new(&folder));
            }
        }

        Ok(Self {
            base_dir,
            black_list,
            experiments,
            cosmos: CosmosCatalog::new(cosmos_experiments),
            scanned_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Number of experiments of every kind
    pub fn total(&self) -> usize {
        self.experiments.len() + self.cosmos.len()
    }

    /// Look up any experiment by ID
    pub fn find(&self, expid: &str) -> Option<ExperimentRef<'_>> {
        if let Some(cosmos) = self.cosmos.get(expid) {
            return Some(ExperimentRef::Cosmos(cosmos));
        }
        self.experiments
            .iter()
            .find(|experiment| experiment.expid == expid)
            .map(ExperimentRef::Uncategorized)
    }
}

impl fmt::Display for SimulationRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SimulationRepository with {} experiments ({} COSMOS, {} uncategorized)",
            self.total(),
            self.cosmos.len(),
            self.experiments.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::params::parse_str;
    use std::fs;

    fn write_cosmos_experiment(base: &Path, expid: &str, output: &[&str]) {
        let folder = base.join(expid);
        fs::create_dir(&folder).unwrap();
        let mut contents = String::from("complexity: cosmos\n");
        for file in output {
            contents.push_str(&format!("output: {}\n", file));
        }
        fs::write(folder.join(format!("{}.parameters", expid)), contents).unwrap();
    }

    fn write_plain_experiment(base: &Path, expid: &str) {
        fs::create_dir(base.join(expid)).unwrap();
    }

    fn config_for(base: &Path) -> RepositoryConfig {
        RepositoryConfig {
            base_dir: Some(base.to_path_buf()),
            black_list: Some(Vec::new()),
        }
    }

    #[test]
    fn test_scan_classifies_cosmos_and_uncategorized() {
        let dir = tempfile::tempdir().unwrap();
        write_cosmos_experiment(
            dir.path(),
            "EXP001",
            &["/work/old/EXP001/outdata/EXP001_echam5_main_mm_100101.nc"],
        );
        write_plain_experiment(dir.path(), "EXP002");

        let repo = SimulationRepository::scan(&config_for(dir.path())).unwrap();
        assert_eq!(repo.total(), 2);
        assert_eq!(repo.cosmos.len(), 1);
        assert_eq!(repo.experiments.len(), 1);
        assert!(matches!(repo.find("EXP001"), Some(ExperimentRef::Cosmos(_))));
        assert!(matches!(
            repo.find("EXP002"),
            Some(ExperimentRef::Uncategorized(_))
        ));
        assert!(repo.find("EXP999").is_none());
    }

    #[test]
    fn test_scan_orders_experiments_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for expid in ["charlie", "alpha", "bravo"] {
            write_cosmos_experiment(dir.path(), expid, &[]);
        }

        let repo = SimulationRepository::scan(&config_for(dir.path())).unwrap();
        let ids: Vec<&str> = repo.cosmos.iter().map(|e| e.expid()).collect();
        assert_eq!(ids, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_scan_skips_blacklisted_experiments() {
        let dir = tempfile::tempdir().unwrap();
        write_cosmos_experiment(dir.path(), "EXP001", &[]);
        write_cosmos_experiment(dir.path(), "EXP002", &[]);

        let config = RepositoryConfig {
            base_dir: Some(dir.path().to_path_buf()),
            black_list: Some(vec!["EXP001".to_string()]),
        };
        let repo = SimulationRepository::scan(&config).unwrap();
        assert_eq!(repo.total(), 1);
        assert!(repo.find("EXP001").is_none());
        assert!(repo.find("EXP002").is_some());
    }

    #[test]
    fn test_scan_ignores_stray_files_in_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), "not an experiment\n").unwrap();
        write_plain_experiment(dir.path(), "EXP001");

        let repo = SimulationRepository::scan(&config_for(dir.path())).unwrap();
        assert_eq!(repo.total(), 1);
    }

    #[test]
    fn test_scan_missing_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("not_there"));
        let err = SimulationRepository::scan(&config).unwrap_err();
        assert!(matches!(err, RepositoryError::BaseDirNotFound(_)));
    }

    #[test]
    fn test_scan_fails_on_missing_complexity() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("EXP001");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("EXP001.parameters"), "setup: cosmos\n").unwrap();

        let err = SimulationRepository::scan(&config_for(dir.path())).unwrap_err();
        match err {
            RepositoryError::MissingComplexity { expid } => assert_eq!(expid, "EXP001"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_scan_fails_on_unsupported_complexity() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("EXP001");
        fs::create_dir(&folder).unwrap();
        fs::write(
            folder.join("EXP001.parameters"),
            "complexity: mpiom\noutput: x.nc\n",
        )
        .unwrap();

        let err = SimulationRepository::scan(&config_for(dir.path())).unwrap_err();
        match err {
            RepositoryError::UnsupportedComplexity { expid, complexity } => {
                assert_eq!(expid, "EXP001");
                assert_eq!(complexity, "mpiom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_classify_matches_cosmos_substring() {
        let params = parse_str("complexity: cosmos-aso-lsm\n").unwrap();
        assert_eq!(
            classify("EXP001", &params).unwrap(),
            ExperimentKind::Cosmos
        );

        let params = parse_str("complexity: pism\ncomplexity: cosmos\n").unwrap();
        assert_eq!(
            classify("EXP001", &params).unwrap(),
            ExperimentKind::Cosmos
        );
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("EXP900.parameters");
        let now = SystemTime::now();
        let params = parse_str("complexity: cosmos\noutput: a.nc\n").unwrap();
        let experiment =
            CosmosExperiment::from_params(RepoExperiment::new("/repo/EXP900"), params).unwrap();

        cache_experiment(&key, now, 42, &experiment);
        let hit = get_cached_experiment(&key, now, 42).unwrap();
        assert_eq!(hit.expid(), "EXP900");

        // stale metadata misses
        assert!(get_cached_experiment(&key, now, 43).is_none());
    }

    #[test]
    fn test_clear_scan_cache() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("EXP901.parameters");
        let now = SystemTime::now();
        let params = parse_str("complexity: cosmos\noutput: a.nc\n").unwrap();
        let experiment =
            CosmosExperiment::from_params(RepoExperiment::new("/repo/EXP901"), params).unwrap();

        cache_experiment(&key, now, 7, &experiment);
        clear_scan_cache();
        assert!(get_cached_experiment(&key, now, 7).is_none());
    }

    #[test]
    fn test_repository_display() {
        let dir = tempfile::tempdir().unwrap();
        write_cosmos_experiment(dir.path(), "EXP001", &[]);
        write_plain_experiment(dir.path(), "EXP002");

        let repo = SimulationRepository::scan(&config_for(dir.path())).unwrap();
        assert_eq!(
            repo.to_string(),
            "SimulationRepository with 2 experiments (1 COSMOS, 1 uncategorized)"
        );
    }

    #[test]
    fn test_config_resolution_precedence() {
        // the only test touching these variables, so no cross-test races
        std::env::remove_var(BASE_DIR_ENV);
        std::env::remove_var(BLACK_LIST_ENV);

        let explicit = RepositoryConfig {
            base_dir: Some(PathBuf::from("/explicit")),
            black_list: Some(vec!["keep".to_string()]),
        };
        let (base, black) = explicit.resolve();
        assert_eq!(base, PathBuf::from("/explicit"));
        assert_eq!(black, vec!["keep".to_string()]);

        std::env::set_var(BASE_DIR_ENV, "/from_env");
        std::env::set_var(BLACK_LIST_ENV, "a:b::c");

        // arguments still win over the environment
        let (base, _) = explicit.resolve();
        assert_eq!(base, PathBuf::from("/explicit"));

        let from_env = RepositoryConfig::default();
        let (base, black) = from_env.resolve();
        assert_eq!(base, PathBuf::from("/from_env"));
        assert_eq!(
            black,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );

        std::env::remove_var(BASE_DIR_ENV);
        std::env::remove_var(BLACK_LIST_ENV);

        let (base, black) = RepositoryConfig::default().resolve();
        assert_eq!(base, PathBuf::from(DEFAULT_BASE_DIR));
        assert!(black.is_empty());
    }
}

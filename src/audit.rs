//! Repository audit
//!
//! The lenient counterpart to scanning: walks every experiment folder and
//! collects problems instead of stopping at the first one. Layout checks
//! cover the four standard sub-folders, the parameter file, and whether the
//! cataloged stream files actually exist on disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::models::experiment::{
    expid_from_dir, CosmosExperiment, RepoExperiment, STANDARD_DIRS,
};
use crate::parser::params::parse_file;
use crate::repository::{classify, RepositoryConfig, RepositoryError};

/// Severity of an audit finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single problem found during a repository audit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A standard sub-folder is absent
    MissingFolder { expid: String, folder: String },
    /// The parameter file fails to parse or lacks a required key
    BadParameterFile { expid: String, reason: String },
    /// The parameter file has no `complexity` key
    MissingComplexity { expid: String },
    /// The `complexity` value names no supported model family
    UnsupportedComplexity { expid: String, complexity: String },
    /// A cataloged file is not on disk
    MissingStreamFile {
        expid: String,
        stream: String,
        path: PathBuf,
    },
    /// A stream with no recorded output files
    EmptyStream { expid: String, stream: String },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::MissingStreamFile { .. } | Finding::EmptyStream { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn expid(&self) -> &str {
        match self {
            Finding::MissingFolder { expid, .. }
            | Finding::BadParameterFile { expid, .. }
            | Finding::MissingComplexity { expid }
            | Finding::UnsupportedComplexity { expid, .. }
            | Finding::MissingStreamFile { expid, .. }
            | Finding::EmptyStream { expid, .. } => expid,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingFolder { expid, folder } => {
                write!(f, "{}: missing {}/ folder", expid, folder)
            }
            Finding::BadParameterFile { expid, reason } => {
                write!(f, "{}: bad parameter file: {}", expid, reason)
            }
            Finding::MissingComplexity { expid } => {
                write!(f, "{}: no complexity defined", expid)
            }
            Finding::UnsupportedComplexity { expid, complexity } => {
                write!(f, "{}: unsupported complexity '{}'", expid, complexity)
            }
            Finding::MissingStreamFile { expid, stream, path } => {
                write!(f, "{}: {} file not on disk: {:?}", expid, stream, path)
            }
            Finding::EmptyStream { expid, stream } => {
                write!(f, "{}: no {} files recorded", expid, stream)
            }
        }
    }
}

/// Aggregated audit findings for one repository
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub base_dir: PathBuf,
    pub experiments_checked: usize,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity() == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity() == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Audit the repository, collecting findings without stopping
pub fn audit(config: &RepositoryConfig) -> Result<AuditReport, RepositoryError> {
    let (base_dir, black_list) = config.resolve();
    tracing::debug!("Auditing {:?}", base_dir);

    if !base_dir.is_dir() {
        return Err(RepositoryError::BaseDirNotFound(base_dir));
    }

    let mut folders: Vec<PathBuf> = fs::read_dir(&base_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    folders.sort();

    let mut findings = Vec::new();
    let mut experiments_checked = 0;

    for folder in folders {
        if !folder.is_dir() {
            continue;
        }
        let expid = expid_from_dir(&folder);
        if black_list.contains(&expid) {
            continue;
        }
        experiments_checked += 1;

        check_standard_dirs(&folder, &expid, &mut findings);

        let param_file = folder.join(format!("{}.parameters", expid));
        if !param_file.is_file() {
            continue;
        }
        match parse_file(&param_file) {
            Err(err) => findings.push(Finding::BadParameterFile {
                expid,
                reason: err.to_string(),
            }),
            Ok(params) => match classify(&expid, &params) {
                Ok(_) => {
                    match CosmosExperiment::from_params(RepoExperiment::new(&folder), params) {
                        Ok(cosmos) => check_streams(&cosmos, &mut findings),
                        Err(err) => findings.push(Finding::BadParameterFile {
                            expid,
                            reason: err.to_string(),
                        }),
                    }
                }
                Err(RepositoryError::MissingComplexity { .. }) => {
                    findings.push(Finding::MissingComplexity { expid })
                }
                Err(RepositoryError::UnsupportedComplexity { complexity, .. }) => {
                    findings.push(Finding::UnsupportedComplexity { expid, complexity })
                }
                Err(err) => findings.push(Finding::BadParameterFile {
                    expid,
                    reason: err.to_string(),
                }),
            },
        }
    }

    Ok(AuditReport {
        base_dir,
        experiments_checked,
        findings,
    })
}

fn check_standard_dirs(folder: &Path, expid: &str, findings: &mut Vec<Finding>) {
    for name in STANDARD_DIRS {
        if !folder.join(name).is_dir() {
            findings.push(Finding::MissingFolder {
                expid: expid.to_string(),
                folder: name.to_string(),
            });
        }
    }
}

fn check_streams(cosmos: &CosmosExperiment, findings: &mut Vec<Finding>) {
    for entry in &cosmos.entries {
        if entry.args.urlpath.is_empty() {
            findings.push(Finding::EmptyStream {
                expid: cosmos.expid().to_string(),
                stream: entry.name.clone(),
            });
            continue;
        }
        for path in &entry.args.urlpath {
            if !path.is_file() {
                findings.push(Finding::MissingStreamFile {
                    expid: cosmos.expid().to_string(),
                    stream: entry.name.clone(),
                    path: path.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::COSMOS_STREAM_TAGS;

    fn config_for(base: &Path) -> RepositoryConfig {
        RepositoryConfig {
            base_dir: Some(base.to_path_buf()),
            black_list: Some(Vec::new()),
        }
    }

    fn make_standard_dirs(folder: &Path) {
        for name in STANDARD_DIRS {
            fs::create_dir_all(folder.join(name)).unwrap();
        }
    }

    /// A COSMOS experiment with one on-disk output file per stream
    fn make_clean_cosmos(base: &Path, expid: &str) {
        let folder = base.join(expid);
        make_standard_dirs(&folder);
        let mut contents = String::from("complexity: cosmos\n");
        for tag in COSMOS_STREAM_TAGS {
            let name = format!("{}_{}_100101.nc", expid, tag);
            contents.push_str(&format!("output: /work/old/{}/outdata/{}\n", expid, name));
            fs::write(folder.join("output").join(&name), "netcdf\n").unwrap();
        }
        fs::write(folder.join(format!("{}.parameters", expid)), contents).unwrap();
    }

    #[test]
    fn test_audit_clean_repository() {
        let dir = tempfile::tempdir().unwrap();
        make_clean_cosmos(dir.path(), "EXP001");
        make_standard_dirs(&dir.path().join("EXP002"));

        let report = audit(&config_for(dir.path())).unwrap();
        assert!(report.is_clean());
        assert!(!report.has_errors());
        assert_eq!(report.experiments_checked, 2);
    }

    #[test]
    fn test_audit_flags_missing_folders() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("EXP001");
        fs::create_dir_all(folder.join("output")).unwrap();
        fs::create_dir_all(folder.join("input")).unwrap();

        let report = audit(&config_for(dir.path())).unwrap();
        assert_eq!(report.error_count(), 2);
        let missing: Vec<&str> = report
            .findings
            .iter()
            .filter_map(|finding| match finding {
                Finding::MissingFolder { folder, .. } => Some(folder.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["executable", "scripts"]);
    }

    #[test]
    fn test_audit_collects_complexity_problems_across_experiments() {
        let dir = tempfile::tempdir().unwrap();

        let first = dir.path().join("EXP001");
        make_standard_dirs(&first);
        fs::write(first.join("EXP001.parameters"), "setup: cosmos\n").unwrap();

        let second = dir.path().join("EXP002");
        make_standard_dirs(&second);
        fs::write(second.join("EXP002.parameters"), "complexity: mpiom\n").unwrap();

        let report = audit(&config_for(dir.path())).unwrap();
        assert!(report
            .findings
            .contains(&Finding::MissingComplexity {
                expid: "EXP001".to_string()
            }));
        assert!(report.findings.contains(&Finding::UnsupportedComplexity {
            expid: "EXP002".to_string(),
            complexity: "mpiom".to_string(),
        }));
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn test_audit_flags_unparseable_parameter_file() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("EXP001");
        make_standard_dirs(&folder);
        fs::write(folder.join("EXP001.parameters"), "complexity cosmos\n").unwrap();

        let report = audit(&config_for(dir.path())).unwrap();
        assert_eq!(report.error_count(), 1);
        assert!(matches!(
            report.findings[0],
            Finding::BadParameterFile { .. }
        ));
    }

    #[test]
    fn test_audit_flags_missing_output_key() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("EXP001");
        make_standard_dirs(&folder);
        fs::write(folder.join("EXP001.parameters"), "complexity: cosmos\n").unwrap();

        let report = audit(&config_for(dir.path())).unwrap();
        assert_eq!(report.error_count(), 1);
        match &report.findings[0] {
            Finding::BadParameterFile { expid, reason } => {
                assert_eq!(expid, "EXP001");
                assert!(reason.contains("output"));
            }
            other => panic!("unexpected finding: {:?}", other),
        }
    }

    #[test]
    fn test_audit_warns_on_missing_stream_files() {
        let dir = tempfile::tempdir().unwrap();
        make_clean_cosmos(dir.path(), "EXP001");
        // remove one cataloged file from disk
        fs::remove_file(
            dir.path()
                .join("EXP001/output/EXP001_echam5_main_mm_100101.nc"),
        )
        .unwrap();

        let report = audit(&config_for(dir.path())).unwrap();
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 1);
        match &report.findings[0] {
            Finding::MissingStreamFile { expid, stream, .. } => {
                assert_eq!(expid, "EXP001");
                assert_eq!(stream, "echam5_main");
            }
            other => panic!("unexpected finding: {:?}", other),
        }
    }

    #[test]
    fn test_audit_warns_on_empty_streams() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("EXP001");
        make_standard_dirs(&folder);
        let name = "EXP001_echam5_main_mm_100101.nc";
        fs::write(folder.join("output").join(name), "netcdf\n").unwrap();
        fs::write(
            folder.join("EXP001.parameters"),
            format!("complexity: cosmos\noutput: /work/old/EXP001/outdata/{}\n", name),
        )
        .unwrap();

        let report = audit(&config_for(dir.path())).unwrap();
        assert!(!report.has_errors());
        // every stream but echam5_main has no recorded files
        assert_eq!(report.warning_count(), COSMOS_STREAM_TAGS.len() - 1);
        assert!(report
            .findings
            .iter()
            .all(|finding| matches!(finding, Finding::EmptyStream { .. })));
    }

    #[test]
    fn test_audit_respects_blacklist() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("broken")).unwrap();

        let config = RepositoryConfig {
            base_dir: Some(dir.path().to_path_buf()),
            black_list: Some(vec!["broken".to_string()]),
        };
        let report = audit(&config).unwrap();
        assert_eq!(report.experiments_checked, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_finding_severity_and_display() {
        let finding = Finding::MissingFolder {
            expid: "EXP001".to_string(),
            folder: "input".to_string(),
        };
        assert_eq!(finding.severity(), Severity::Error);
        assert_eq!(finding.expid(), "EXP001");
        assert_eq!(finding.to_string(), "EXP001: missing input/ folder");

        let finding = Finding::EmptyStream {
            expid: "EXP001".to_string(),
            stream: "echam5_wiso".to_string(),
        };
        assert_eq!(finding.severity(), Severity::Warning);
        assert_eq!(finding.to_string(), "EXP001: no echam5_wiso files recorded");
    }
}

//! Command handlers
//!
//! One handler per `sim_repo` subcommand. Handlers scan through the
//! library and print to stdout; exit codes are decided by the caller.

use std::path::PathBuf;
use std::time::Duration;

use crate::audit::audit;
use crate::export::{
    csv_export, generate_export_filename, get_export_directory, json_export, ExportFormat,
    ExportableExperiment,
};
use crate::models::experiment::{CosmosExperiment, ExperimentKind, RepoExperiment, STANDARD_DIRS};
use crate::repository::{ExperimentRef, RepositoryConfig, SimulationRepository};
use crate::summary::{experiment_summaries, RepositorySummary};
use crate::watcher::{RepositoryWatcher, WatchEvent};
use crate::CommandError;

/// List the repository inventory as a table
pub fn list(config: &RepositoryConfig, kind: Option<&str>) -> Result<(), CommandError> {
    let kind: Option<ExperimentKind> = kind.map(str::parse).transpose()?;
    let repo = SimulationRepository::scan(config)?;
    let rows: Vec<_> = experiment_summaries(&repo)
        .into_iter()
        .filter(|row| kind.map_or(true, |k| row.kind == k))
        .collect();

    if rows.is_empty() {
        println!("No experiments found in {:?}", repo.base_dir);
        return Ok(());
    }

    println!(
        "Found {} experiment(s) in {:?}:\n",
        rows.len(),
        repo.base_dir
    );
    println!(
        "{:<22} {:<14} {:>6} {:>8} {:>6}  {}",
        "EXPERIMENT", "KIND", "PARAMS", "STREAMS", "FILES", "PATH"
    );
    println!("{}", "-".repeat(78));
    for row in rows {
        println!(
            "{:<22} {:<14} {:>6} {:>8} {:>6}  {}",
            truncate_string(&row.expid, 22),
            row.kind,
            row.param_count,
            row.stream_count,
            row.file_count,
            row.base_dir.display()
        );
    }
    Ok(())
}

/// Show one experiment in detail
pub fn show(config: &RepositoryConfig, expid: &str) -> Result<(), CommandError> {
    let repo = SimulationRepository::scan(config)?;
    let experiment = repo
        .find(expid)
        .ok_or_else(|| CommandError::ExperimentNotFound(expid.to_string()))?;

    match experiment {
        ExperimentRef::Cosmos(cosmos) => show_cosmos(cosmos),
        ExperimentRef::Uncategorized(plain) => show_uncategorized(plain),
    }
    Ok(())
}

fn show_cosmos(cosmos: &CosmosExperiment) {
    println!("Experiment: {}", cosmos.expid());
    println!("Kind:       {}", ExperimentKind::Cosmos);
    println!("Location:   {}", cosmos.experiment.base_dir.display());
    println!(
        "Parameters: {} key(s) in {}",
        cosmos.params.len(),
        cosmos.experiment.parameter_file().display()
    );
    show_folders(&cosmos.experiment);
    println!();
    println!("Streams:");
    for entry in &cosmos.entries {
        println!("  {:<14} {:>6} file(s)", entry.name, entry.file_count());
    }
}

fn show_uncategorized(plain: &RepoExperiment) {
    println!("Experiment: {}", plain.expid);
    println!("Kind:       {}", ExperimentKind::Uncategorized);
    println!("Location:   {}", plain.base_dir.display());
    show_folders(plain);
}

fn show_folders(experiment: &RepoExperiment) {
    println!();
    println!("Folders:");
    for name in STANDARD_DIRS {
        let state = if experiment.base_dir.join(name).is_dir() {
            "present"
        } else {
            "missing"
        };
        println!("  {:<12} {}", format!("{}/", name), state);
    }
}

/// Print an experiment's parsed parameter file as JSON
pub fn params(config: &RepositoryConfig, expid: &str) -> Result<(), CommandError> {
    let repo = SimulationRepository::scan(config)?;
    match repo.find(expid) {
        Some(ExperimentRef::Cosmos(cosmos)) => {
            let json = serde_json::to_string_pretty(&cosmos.params)
                .map_err(|e| CommandError::Internal(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
            Ok(())
        }
        Some(ExperimentRef::Uncategorized(_)) => Err(CommandError::Internal(format!(
            "Experiment {} has no parameter file",
            expid
        ))),
        None => Err(CommandError::ExperimentNotFound(expid.to_string())),
    }
}

/// Print the COSMOS catalog (or one experiment's entries) as JSON
pub fn catalog(config: &RepositoryConfig, expid: Option<&str>) -> Result<(), CommandError> {
    let repo = SimulationRepository::scan(config)?;
    let json = match expid {
        None => serde_json::to_string_pretty(&repo.cosmos),
        Some(expid) => match repo.cosmos.get(expid) {
            Some(cosmos) => serde_json::to_string_pretty(&cosmos.entries),
            None if repo.find(expid).is_some() => {
                return Err(CommandError::Internal(format!(
                    "Experiment {} is not a COSMOS experiment",
                    expid
                )))
            }
            None => return Err(CommandError::ExperimentNotFound(expid.to_string())),
        },
    }
    .map_err(|e| CommandError::Internal(format!("Failed to serialize JSON: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Check the repository layout; returns whether error findings exist
pub fn check(config: &RepositoryConfig) -> Result<bool, CommandError> {
    let report = audit(config)?;

    if report.is_clean() {
        println!(
            "Checked {} experiment(s) in {:?}: no problems found",
            report.experiments_checked, report.base_dir
        );
        return Ok(false);
    }

    println!(
        "Checked {} experiment(s) in {:?}:\n",
        report.experiments_checked, report.base_dir
    );
    for finding in &report.findings {
        println!("{:<8} {}", finding.severity(), finding);
    }
    println!(
        "\n{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    Ok(report.has_errors())
}

/// Print repository totals
pub fn summary(config: &RepositoryConfig, json: bool) -> Result<(), CommandError> {
    let repo = SimulationRepository::scan(config)?;
    let summary = RepositorySummary::from_repository(&repo);
    if json {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| CommandError::Internal(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", text);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

/// Export the experiment inventory; returns the written path
pub fn export(
    config: &RepositoryConfig,
    format: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf, CommandError> {
    let format: ExportFormat = format.parse()?;
    let repo = SimulationRepository::scan(config)?;
    let rows: Vec<ExportableExperiment> = experiment_summaries(&repo)
        .iter()
        .map(ExportableExperiment::from)
        .collect();

    let directory = output.unwrap_or_else(get_export_directory);
    std::fs::create_dir_all(&directory)?;
    let path = directory.join(generate_export_filename(
        "sim_repo_inventory",
        format.extension(),
    ));

    match format {
        ExportFormat::Csv => csv_export::write_inventory_csv(&rows, &path)?,
        ExportFormat::Json => json_export::write_inventory_json(&rows, &path)?,
    }

    println!("Exported {} experiment(s) to {:?}", rows.len(), path);
    Ok(path)
}

/// Watch the repository, rescanning on changes and every `interval` seconds
pub fn watch(config: &RepositoryConfig, interval: u64) -> Result<(), CommandError> {
    let (base_dir, black_list) = config.resolve();
    let mut watcher = RepositoryWatcher::new(base_dir.clone())?;
    watcher.start()?;

    let mut repo = SimulationRepository::scan(config)?;
    println!("{}", repo);
    println!(
        "Watching {:?} (rescanning every {}s, Ctrl-C to stop)",
        base_dir, interval
    );

    let tick = Duration::from_secs(1);
    let mut since_rescan = Duration::ZERO;
    loop {
        std::thread::sleep(tick);
        since_rescan += tick;

        let mut rescan = since_rescan >= Duration::from_secs(interval);
        for event in watcher.poll() {
            if black_list.iter().any(|id| id == event.expid()) {
                continue;
            }
            match event {
                WatchEvent::ExperimentAdded { expid, .. } => {
                    println!("new experiment: {}", expid);
                    rescan = true;
                }
                WatchEvent::ExperimentRemoved { expid, .. } => {
                    println!("removed: {}", expid);
                    rescan = true;
                }
                WatchEvent::ParameterFileChanged { expid, .. } => {
                    println!("parameters changed: {}", expid);
                    rescan = true;
                }
                WatchEvent::OutputChanged { expid, .. } => {
                    // output arrives in bursts; the periodic rescan picks it up
                    tracing::debug!("Output changed for {}", expid);
                }
            }
        }

        if rescan {
            since_rescan = Duration::ZERO;
            match SimulationRepository::scan(config) {
                Ok(rescanned) => {
                    if rescanned.total() != repo.total() {
                        println!("{}", rescanned);
                    }
                    repo = rescanned;
                }
                Err(e) => tracing::error!("Rescan failed: {}", e),
            }
        }
    }
}

/// Truncate a string with ellipsis when it exceeds `max_len`
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

//! File change event handlers
//!
//! Maps raw notify events onto the repository layout: which experiment a
//! changed path belongs to, and whether the change touches the experiment
//! itself, its parameter file, or its output folder.

use std::path::{Component, Path, PathBuf};

use notify::{Event, EventKind};

use super::WatchEvent;

/// Convert a notify event into a repository watch event.
///
/// Changes outside any experiment directory, and changes to files the
/// repository does not track, yield `None`.
pub fn handle_event(base_dir: &Path, event: Event) -> Option<WatchEvent> {
    let path = event.paths.first()?.clone();

    match event.kind {
        EventKind::Create(_) => handle_create(base_dir, path),
        EventKind::Modify(_) => handle_modify(base_dir, path),
        EventKind::Remove(_) => handle_remove(base_dir, path),
        _ => None,
    }
}

fn handle_create(base_dir: &Path, path: PathBuf) -> Option<WatchEvent> {
    let (expid, root) = experiment_root(base_dir, &path)?;
    if path == root {
        tracing::debug!("New experiment directory: {:?}", path);
        return Some(WatchEvent::ExperimentAdded { expid, path });
    }
    if is_parameter_file(&expid, &root, &path) {
        return Some(WatchEvent::ParameterFileChanged { expid, path });
    }
    if is_output_path(&root, &path) {
        return Some(WatchEvent::OutputChanged { expid, path });
    }
    None
}

fn handle_modify(base_dir: &Path, path: PathBuf) -> Option<WatchEvent> {
    let (expid, root) = experiment_root(base_dir, &path)?;
    if is_parameter_file(&expid, &root, &path) {
        return Some(WatchEvent::ParameterFileChanged { expid, path });
    }
    if is_output_path(&root, &path) {
        return Some(WatchEvent::OutputChanged { expid, path });
    }
    None
}

fn handle_remove(base_dir: &Path, path: PathBuf) -> Option<WatchEvent> {
    let (expid, root) = experiment_root(base_dir, &path)?;
    if path == root {
        tracing::debug!("Experiment directory removed: {:?}", path);
        return Some(WatchEvent::ExperimentRemoved { expid, path });
    }
    if is_parameter_file(&expid, &root, &path) {
        return Some(WatchEvent::ParameterFileChanged { expid, path });
    }
    if is_output_path(&root, &path) {
        return Some(WatchEvent::OutputChanged { expid, path });
    }
    None
}

/// The experiment directory (direct child of the base dir) a path belongs to
fn experiment_root(base_dir: &Path, path: &Path) -> Option<(String, PathBuf)> {
    let rel = path.strip_prefix(base_dir).ok()?;
    match rel.components().next()? {
        Component::Normal(name) => {
            let expid = name.to_str()?.to_string();
            let root = base_dir.join(&expid);
            Some((expid, root))
        }
        _ => None,
    }
}

/// Whether a path is the experiment's own parameter file
fn is_parameter_file(expid: &str, root: &Path, path: &Path) -> bool {
    let expected = format!("{}.parameters", expid);
    path.parent() == Some(root) && path.file_name().is_some_and(|name| name == expected.as_str())
}

/// Whether a path sits in the experiment's `output/` folder
fn is_output_path(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rel| rel.starts_with("output"))
        .unwrap_or(false)
}

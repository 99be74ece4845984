//! File watcher module
//!
//! Watches the repository base directory for changes:
//! - Experiment directories appearing or disappearing
//! - Parameter file edits
//! - Output files arriving under an experiment

pub mod handler;

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

/// Watcher errors
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Events emitted for repository changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A new experiment directory appeared
    ExperimentAdded { expid: String, path: PathBuf },
    /// An experiment directory was removed
    ExperimentRemoved { expid: String, path: PathBuf },
    /// An experiment's parameter file was created, edited or removed
    ParameterFileChanged { expid: String, path: PathBuf },
    /// Files under an experiment's `output/` folder changed
    OutputChanged { expid: String, path: PathBuf },
}

impl WatchEvent {
    pub fn expid(&self) -> &str {
        match self {
            WatchEvent::ExperimentAdded { expid, .. }
            | WatchEvent::ExperimentRemoved { expid, .. }
            | WatchEvent::ParameterFileChanged { expid, .. }
            | WatchEvent::OutputChanged { expid, .. } => expid,
        }
    }
}

/// Watches a repository base directory for experiment changes
pub struct RepositoryWatcher {
    watcher: RecommendedWatcher,
    base_dir: PathBuf,
    rx: Receiver<Result<Event, notify::Error>>,
}

impl RepositoryWatcher {
    /// Create a new watcher for the given base directory
    pub fn new(base_dir: PathBuf) -> Result<Self, WatcherError> {
        let (tx, rx) = channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        Ok(Self {
            watcher,
            base_dir,
            rx,
        })
    }

    /// Start watching the base directory
    pub fn start(&mut self) -> Result<(), WatcherError> {
        if !self.base_dir.exists() {
            return Err(WatcherError::PathNotFound(self.base_dir.clone()));
        }

        self.watcher
            .watch(&self.base_dir, RecursiveMode::Recursive)?;
        tracing::info!("Started watching: {:?}", self.base_dir);
        Ok(())
    }

    /// Stop watching
    pub fn stop(&mut self) -> Result<(), WatcherError> {
        self.watcher.unwatch(&self.base_dir)?;
        tracing::info!("Stopped watching: {:?}", self.base_dir);
        Ok(())
    }

    /// Poll for pending events without blocking
    pub fn poll(&self) -> Vec<WatchEvent> {
        let mut events = Vec::new();

        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => {
                    if let Some(watch_event) = handler::handle_event(&self.base_dir, event) {
                        events.push(watch_event);
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_creation() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = RepositoryWatcher::new(dir.path().to_path_buf());
        assert!(watcher.is_ok());
    }

    #[test]
    fn test_start_fails_for_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher =
            RepositoryWatcher::new(dir.path().join("not_there")).unwrap();
        let err = watcher.start().unwrap_err();
        assert!(matches!(err, WatcherError::PathNotFound(_)));
    }

    #[test]
    fn test_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = RepositoryWatcher::new(dir.path().to_path_buf()).unwrap();
        watcher.start().unwrap();
        watcher.stop().unwrap();
    }

    #[test]
    fn test_poll_on_idle_watcher_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = RepositoryWatcher::new(dir.path().to_path_buf()).unwrap();
        assert!(watcher.poll().is_empty());
    }

    #[test]
    fn test_watch_event_expid() {
        let event = WatchEvent::ExperimentAdded {
            expid: "EXP001".to_string(),
            path: PathBuf::from("/repo/EXP001"),
        };
        assert_eq!(event.expid(), "EXP001");
    }
}

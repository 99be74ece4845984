//! ESM Simulation Repository
//!
//! Library backend for the `sim_repo` tool. It handles:
//! - `${EXPID}.parameters` file parsing
//! - Repository scanning and experiment classification
//! - Intake-style catalogs for COSMOS output streams
//! - Repository audits, summaries and inventory export
//! - Watching the base directory for incoming experiments

pub mod audit;
pub mod cli;
pub mod commands;
pub mod export;
pub mod models;
pub mod parser;
pub mod repository;
pub mod summary;
pub mod watcher;

use thiserror::Error;

/// Error type for sim_repo commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Repository error: {0}")]
    Repository(#[from] repository::RepositoryError),

    #[error("Parser error: {0}")]
    Parser(#[from] parser::ParserError),

    #[error("Watcher error: {0}")]
    Watcher(#[from] watcher::WatcherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Experiment not found: {0}")]
    ExperimentNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

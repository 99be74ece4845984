//! Parameter file parsing module
//!
//! Handles parsing of the `${EXPID}.parameters` files found next to each
//! experiment in a simulation repository:
//! - Line-oriented `key: value` extraction
//! - Repeated keys collected into ordered lists
//! - Typed errors carrying the offending line

pub mod params;

pub use params::{parse_file, parse_line, parse_reader, ParamValue, Parameters};

use thiserror::Error;

/// Errors that can occur while parsing a parameter file
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not split line '{line}' into key and value in {origin}")]
    BadLine { line: String, origin: String },
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

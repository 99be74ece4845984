//! Data models module
//!
//! Contains the core data structures describing a simulation repository:
//! - Experiments (generic and COSMOS)
//! - Intake-style catalog entries for COSMOS output streams

pub mod catalog;
pub mod experiment;

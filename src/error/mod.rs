//! Error handling module
//!
//! Defines `DeployError` and the process exit code for each failure kind

pub mod types;

pub use types::*;

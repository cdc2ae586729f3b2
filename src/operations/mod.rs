//! Operations module
//!
//! Coordinates deploy runs and the archive rewriting they end with

pub mod archive;
pub mod deploy;

pub use deploy::*;

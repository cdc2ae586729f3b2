//! Command-line interface module
//!
//! Handles argument parsing and terminal prompts

pub mod args;
pub mod console;

pub use args::*;
pub use console::ConsoleConfigurer;

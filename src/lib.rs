//! `deployconf` - Apply deployment configuration to packaged zip artifacts
//!
//! A source archive ships a deployment template describing the
//! configuration its deployment needs. This library merges that template
//! with the answers persisted for the deployment target, asks for missing
//! answers when running interactively, and writes a copy of the archive in
//! which properties files are generated and text entries are filtered with
//! the configured values.

pub mod cli;
pub mod config;
pub mod error;
pub mod group;
pub mod interactive;
pub mod operations;
pub mod system;
pub mod task;
pub mod utils;

use anyhow::Result;
use cli::{Args, ConsoleConfigurer, DEFAULT_REPOSITORY_DIR};
use error::DeployError;
use group::FileSystemConfigGroupManager;
use operations::deploy::{DeployOperation, DeployOptions, RunOutcome};
use std::path::{Path, PathBuf};
use system::{RealSystem, System};
use tracing::debug;

/// Main entry point for the deployconf library
///
/// # Errors
///
/// Returns an error if the repository cannot be prepared or the run fails
pub fn run(args: &Args) -> Result<RunOutcome> {
    let system = RealSystem::new();
    let repository = resolve_repository(args.repo.as_deref())?;
    run_with(args, &repository, &system)
}

/// Run against the given repository directory and system
///
/// # Errors
///
/// Returns an error if the repository cannot be prepared or the run fails
pub fn run_with(args: &Args, repository: &Path, system: &dyn System) -> Result<RunOutcome> {
    prepare_repository(system, repository)?;

    let mut options = DeployOptions::new(&args.input, &args.output, repository);
    options.config_file.clone_from(&args.deployment_config_file);
    options
        .template_path
        .clone_from(&args.deployment_template_path);
    options.mode = args.run_mode();

    let mut groups = FileSystemConfigGroupManager::new(system, repository)?;
    let mut configurer = ConsoleConfigurer::new();
    DeployOperation::new(options, system).execute(&mut groups, &mut configurer)
}

/// The repository directory: explicit, else `~/.deployconf_repo`
///
/// # Errors
///
/// Returns a `DeployError::Filesystem` when no home directory can be determined
pub fn resolve_repository(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_REPOSITORY_DIR))
        .ok_or_else(|| {
            DeployError::filesystem("Cannot determine the home directory for the repository")
                .into()
        })
}

/// Create the repository directory when missing
///
/// # Errors
///
/// Returns a `DeployError::Filesystem` when the path exists but is not a
/// directory, or cannot be created
pub fn prepare_repository(system: &dyn System, repository: &Path) -> Result<()> {
    let exists = system.exists(repository).map_err(|err| {
        DeployError::filesystem(format!("Failed to access {}: {err}", repository.display()))
    })?;
    let is_dir = system.is_dir(repository).map_err(|err| {
        DeployError::filesystem(format!("Failed to access {}: {err}", repository.display()))
    })?;

    if exists && !is_dir {
        return Err(DeployError::filesystem(format!(
            "Repository is not a directory: {}",
            repository.display()
        ))
        .into());
    }
    if !exists {
        debug!("Creating repository directory: {}", repository.display());
        system.create_dir_all(repository).map_err(|err| {
            DeployError::filesystem(format!(
                "Failed to create repository {}: {err}",
                repository.display()
            ))
        })?;
    }
    Ok(())
}

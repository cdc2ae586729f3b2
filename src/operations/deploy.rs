//! Deploy operation coordination

use crate::config::{DeploymentConfig, DeploymentReader};
use crate::error::DeployError;
use crate::group::ConfigGroupManager;
use crate::interactive::InteractiveConfigurer;
use crate::operations::archive::read_entry;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default location of the template inside the source archive
pub const DEFAULT_TEMPLATE_PATH: &str = "META-INF/deployment-template.xml";

/// File name of a persisted config without a name
pub const DEFAULT_CONFIG_FILE: &str = "deployment-config.xml";

/// File name suffix of a named persisted config
pub const CONFIG_FILE_SUFFIX: &str = "-deployment-config.xml";

/// How missing configuration values are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Never prompt; an incomplete configuration ends the run
    #[default]
    NonInteractive,
    /// Prompt for values that are missing
    Interactive,
    /// Prompt for every value, even configured ones
    ForceInteractive,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The destination archive was written
    Applied { destination: PathBuf },
    /// Values are missing; the merged configuration was saved to `config_path`
    Incomplete { config_path: PathBuf },
}

impl RunOutcome {
    /// Process exit code for this outcome
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Applied { .. } => 0,
            Self::Incomplete { .. } => 2,
        }
    }
}

/// Everything a deploy run needs to know
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Directory holding persisted configs and config groups
    pub repository: PathBuf,
    /// Explicit persisted config file, overriding the repository lookup
    pub config_file: Option<PathBuf>,
    pub template_path: String,
    pub mode: RunMode,
}

impl DeployOptions {
    #[must_use]
    #[inline]
    pub fn new<S: Into<PathBuf>, D: Into<PathBuf>, R: Into<PathBuf>>(
        source: S,
        destination: D,
        repository: R,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            repository: repository.into(),
            config_file: None,
            template_path: DEFAULT_TEMPLATE_PATH.to_owned(),
            mode: RunMode::default(),
        }
    }
}

/// Coordinates one deploy run: template loading, merging, prompting,
/// saving and archive rewriting
#[non_exhaustive]
#[expect(clippy::module_name_repetitions, reason = "DeployOperation")]
pub struct DeployOperation<'src> {
    options: DeployOptions,
    system: &'src dyn System,
}

impl<'src> DeployOperation<'src> {
    #[must_use]
    #[inline]
    pub const fn new(options: DeployOptions, system: &'src dyn System) -> Self {
        Self { options, system }
    }

    #[must_use]
    #[inline]
    pub const fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// Location of the persisted config for a configuration name
    #[must_use]
    pub fn deployment_config_path(&self, name: Option<&str>) -> PathBuf {
        if let Some(file) = &self.options.config_file {
            return file.clone();
        }
        match name {
            Some(name) => self
                .options
                .repository
                .join(format!("{name}{CONFIG_FILE_SUFFIX}")),
            None => self.options.repository.join(DEFAULT_CONFIG_FILE),
        }
    }

    /// Read the template from the source archive
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when the archive has no template
    /// entry or the template is invalid
    pub fn load_template(&self) -> Result<DeploymentConfig> {
        let source = &self.options.source;
        let reader = self.system.open(source).map_err(|err| {
            DeployError::filesystem(format!("Failed to open {}: {err}", source.display()))
        })?;

        let template_path = &self.options.template_path;
        let bytes = read_entry(reader, template_path)?.ok_or_else(|| {
            DeployError::template(format!(
                "No deployment template file found in file '{}': {template_path}",
                source.display()
            ))
        })?;
        let document = String::from_utf8(bytes).map_err(|err| {
            DeployError::template(format!("Template {template_path} is not valid UTF-8: {err}"))
        })?;

        DeploymentReader::parse(&document)
            .with_context(|| format!("Invalid deployment template: {template_path}"))
    }

    /// Run the operation
    ///
    /// # Errors
    ///
    /// Returns an error if the template or persisted config cannot be read,
    /// prompting fails, the config cannot be saved or the archive cannot be
    /// written. An incomplete configuration is not an error.
    pub fn execute(
        &self,
        groups: &mut dyn ConfigGroupManager,
        configurer: &mut dyn InteractiveConfigurer,
    ) -> Result<RunOutcome> {
        let template = self.load_template()?;
        let config_path = self.deployment_config_path(template.name());

        let mut config = if self.exists(&config_path)? {
            debug!("Loading deployment config: {}", config_path.display());
            DeploymentReader::load(self.system, &config_path)?
        } else {
            info!("Creating new deployment config: {}", config_path.display());
            DeploymentConfig::default()
        };

        let configured = config.merge(template, groups)?;
        let mode = self.options.mode;

        if configured && mode != RunMode::ForceInteractive {
            debug!("Deployment config is complete");
            return self.apply(&config, groups);
        }

        if mode != RunMode::NonInteractive
            && config.interactive_merge(configurer, mode == RunMode::ForceInteractive, groups)?
        {
            self.save(&config, &config_path, groups)?;
            return self.apply(&config, groups);
        }

        self.save(&config, &config_path, groups)?;
        warn!("Deployment configuration is incomplete");
        warn!("Rerun in interactive mode by using the '-i' option, or");
        warn!(
            "edit '{}' and make sure that each deployment property has a valid value",
            config_path.display()
        );
        Ok(RunOutcome::Incomplete { config_path })
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        self.system.exists(path).map_err(|err| {
            DeployError::filesystem(format!("Failed to access {}: {err}", path.display())).into()
        })
    }

    fn save(
        &self,
        config: &DeploymentConfig,
        path: &Path,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<()> {
        let mut document = Vec::new();
        config.save(&mut document, groups)?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            self.system.create_dir_all(parent).map_err(|err| {
                DeployError::filesystem(format!("Failed to create {}: {err}", parent.display()))
            })?;
        }
        self.system.write(path, &document).map_err(|err| {
            DeployError::filesystem(format!("Failed to write {}: {err}", path.display()))
        })?;
        info!("Saved deployment config: {}", path.display());
        Ok(())
    }

    fn apply(
        &self,
        config: &DeploymentConfig,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<RunOutcome> {
        let source_path = &self.options.source;
        let destination_path = &self.options.destination;

        let source = self.system.open(source_path).map_err(|err| {
            DeployError::filesystem(format!("Failed to open {}: {err}", source_path.display()))
        })?;
        let destination = self.system.create(destination_path).map_err(|err| {
            DeployError::filesystem(format!(
                "Failed to create {}: {err}",
                destination_path.display()
            ))
        })?;

        let result = config
            .apply(source, destination, &self.options.template_path, groups)
            .and_then(|mut writer| {
                writer
                    .flush()
                    .with_context(|| format!("Failed to flush {}", destination_path.display()))
            });

        if let Err(err) = result {
            if let Err(remove_err) = self.system.remove_file(destination_path) {
                debug!(
                    "Could not remove incomplete {}: {remove_err}",
                    destination_path.display()
                );
            }
            return Err(err);
        }

        info!(
            "Deployment config applied: {} -> {}",
            source_path.display(),
            destination_path.display()
        );
        Ok(RunOutcome::Applied {
            destination: destination_path.clone(),
        })
    }
}

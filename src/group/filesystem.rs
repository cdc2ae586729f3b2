//! Config groups stored as properties files in the repository directory

use super::{ConfigGroup, ConfigGroupManager};
use crate::error::DeployError;
use crate::system::System;
use crate::utils::properties::{parse_properties, render_properties};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name suffix of config group files
pub const CONFIG_GROUP_SUFFIX: &str = "-config-group.properties";

/// Config group persisted in `<dir>/<name>-config-group.properties`
///
/// The whole file is rewritten whenever a property changes.
pub struct FileSystemConfigGroup<'src> {
    system: &'src dyn System,
    path: PathBuf,
    properties: BTreeMap<String, String>,
}

impl<'src> FileSystemConfigGroup<'src> {
    /// Load the group `name` from `dir`, empty when no file exists yet
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Group` when an existing file cannot be read or parsed
    pub fn load(system: &'src dyn System, dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(format!("{name}{CONFIG_GROUP_SUFFIX}"));

        let exists = system.exists(&path).map_err(|err| {
            DeployError::group(format!("Failed to access {}: {err}", path.display()))
        })?;
        let properties = if exists {
            debug!("Loading config group '{name}' from {}", path.display());
            let bytes = system.read(&path).map_err(|err| {
                DeployError::group(format!("Failed to read {}: {err}", path.display()))
            })?;
            parse_properties(&bytes).map_err(|err| {
                DeployError::group(format!("Failed to parse {}: {err}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            system,
            path,
            properties,
        })
    }

    #[must_use]
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store(&self) -> Result<()> {
        self.system
            .write(&self.path, &render_properties(&self.properties))
            .map_err(|err| {
                DeployError::group(format!("Failed to write {}: {err}", self.path.display())).into()
            })
    }
}

impl ConfigGroup for FileSystemConfigGroup<'_> {
    #[inline]
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                self.properties.insert(name.to_owned(), value.to_owned());
            }
            None => {
                if self.properties.remove(name).is_none() {
                    return Ok(());
                }
            }
        }
        self.store()
    }
}

/// Loads config groups from a repository directory, at most once per name
pub struct FileSystemConfigGroupManager<'src> {
    system: &'src dyn System,
    dir: PathBuf,
    groups: HashMap<String, FileSystemConfigGroup<'src>>,
}

impl<'src> FileSystemConfigGroupManager<'src> {
    /// Create a manager for the groups in `dir`
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Group` when `dir` is not an existing directory
    pub fn new(system: &'src dyn System, dir: &Path) -> Result<Self> {
        let is_dir = system.is_dir(dir).map_err(|err| {
            DeployError::group(format!("Failed to access {}: {err}", dir.display()))
        })?;
        if !is_dir {
            return Err(DeployError::group(format!(
                "Config group directory does not exist: {}",
                dir.display()
            ))
            .into());
        }

        Ok(Self {
            system,
            dir: dir.to_path_buf(),
            groups: HashMap::new(),
        })
    }

    #[must_use]
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ConfigGroupManager for FileSystemConfigGroupManager<'_> {
    fn lookup_group(&mut self, name: &str) -> Result<&mut dyn ConfigGroup> {
        if !self.groups.contains_key(name) {
            let group = FileSystemConfigGroup::load(self.system, &self.dir, name)?;
            self.groups.insert(name.to_owned(), group);
        }
        self.groups
            .get_mut(name)
            .map(|group| group as &mut dyn ConfigGroup)
            .ok_or_else(|| DeployError::group(format!("Config group '{name}' is not loaded")).into())
    }
}

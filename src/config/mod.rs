//! Deployment configuration
//!
//! A `DeploymentConfig` is the ordered set of tasks for one deployment
//! target. The template shipped in an archive and the persisted answers for
//! a target are both deployment configs; merging the former into the latter
//! keeps the answers while following the template's structure.

pub mod reader;
pub mod writer;
pub mod xml;

pub use reader::DeploymentReader;
pub use writer::DeploymentWriter;

use crate::group::ConfigGroupManager;
use crate::interactive::InteractiveConfigurer;
use crate::operations::archive::rewrite_archive;
use crate::task::Task;
use anyhow::Result;
use std::io::{Read, Seek, Write};
use tracing::{debug, info};

/// Ordered collection of tasks, unique by task identity
#[derive(Debug, Clone, Default)]
pub struct DeploymentConfig {
    name: Option<String>,
    tasks: Vec<Task>,
}

impl DeploymentConfig {
    #[must_use]
    #[inline]
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            tasks: Vec::new(),
        }
    }

    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    #[must_use]
    #[inline]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[inline]
    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    /// The task with the given identity
    #[must_use]
    #[inline]
    pub fn task(&self, identity: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.identity() == identity)
    }

    /// Add a task unless one with the same identity already exists
    #[inline]
    pub fn add_task(&mut self, task: Task) -> bool {
        if self.tasks.contains(&task) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    /// Merge a template into this configuration
    ///
    /// The template's name is adopted. Tasks the template no longer defines
    /// are dropped, tasks it shares with this configuration absorb the
    /// template definition while keeping entered values, and new template
    /// tasks are appended in template order.
    ///
    /// Returns whether every task is configured afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced group cannot be loaded
    pub fn merge(
        &mut self,
        template: Self,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<bool> {
        self.name = template.name;

        let mut incoming: Vec<Option<Task>> = template.tasks.into_iter().map(Some).collect();
        let mut merged = Vec::with_capacity(incoming.len());

        for mut task in std::mem::take(&mut self.tasks) {
            let matching = incoming
                .iter_mut()
                .find(|candidate| candidate.as_ref().is_some_and(|other| *other == task));
            match matching.and_then(Option::take) {
                Some(other) => {
                    task.merge(other);
                    merged.push(task);
                }
                None => debug!("Dropping task no longer in template: {}", task.identity()),
            }
        }

        for task in incoming.into_iter().flatten() {
            if merged.contains(&task) {
                continue;
            }
            debug!("Adding task from template: {}", task.identity());
            merged.push(task);
        }

        self.tasks = merged;
        self.is_configured(groups)
    }

    /// Whether every task has a value for each of its active items
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced group cannot be loaded
    pub fn is_configured(&self, groups: &mut dyn ConfigGroupManager) -> Result<bool> {
        for task in &self.tasks {
            if !task.is_configured(groups)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Ask for missing values, or for all values when `force_all` is set
    ///
    /// Stops at the first task that could not be configured and returns
    /// `false`; the remaining tasks are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if prompting fails or a group cannot be written
    pub fn interactive_merge(
        &mut self,
        configurer: &mut dyn InteractiveConfigurer,
        force_all: bool,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<bool> {
        configurer.preamble()?;

        for task in &mut self.tasks {
            if !force_all && task.is_configured(groups)? {
                continue;
            }
            if !task.configure_interactively(configurer, force_all, groups)? {
                info!("Interactive configuration of '{}' was not completed", task.identity());
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Persist the configuration as a document
    ///
    /// Inline values of grouped items are first published to their groups,
    /// since the document itself omits them.
    ///
    /// # Errors
    ///
    /// Returns an error if a group cannot be written or the document cannot
    /// be rendered or written
    pub fn save(&self, out: &mut dyn Write, groups: &mut dyn ConfigGroupManager) -> Result<()> {
        for task in &self.tasks {
            task.publish_group_values(groups)?;
        }
        DeploymentWriter::write(out, self)
    }

    /// Copy `source` to `destination`, applying every task to its entry
    ///
    /// # Errors
    ///
    /// Returns an error on archive failures or when a task fails
    pub fn apply<R: Read + Seek, W: Write + Seek>(
        &self,
        source: R,
        destination: W,
        ignored_entry: &str,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<W> {
        rewrite_archive(source, destination, ignored_entry, &self.tasks, groups)
    }
}

//! Configuration tasks
//!
//! A task turns configured values into the content of one archive entry.
//! Tasks are identified by their path alone: two tasks with the same path
//! are the same task, whatever they contain. Merging relies on this to
//! match a persisted task with its newer template definition.

pub mod filter;
pub mod item;
pub mod properties;

use crate::config::xml::Element;
use crate::error::DeployError;
use crate::group::ConfigGroupManager;
use crate::interactive::InteractiveConfigurer;
use anyhow::Result;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

pub use filter::{FilterTask, FilterToken};
pub use item::ConfigItem;
pub use properties::{PropertiesTask, Property};

/// Builds a task from its serialized element
pub type TaskFactory = fn(&Element) -> Result<Task>;

/// Serialized element name → task factory
#[must_use]
pub fn registry() -> HashMap<&'static str, TaskFactory> {
    HashMap::from([
        (
            PropertiesTask::ELEMENT,
            (|element: &Element| PropertiesTask::deserialize(element).map(Task::Properties))
                as TaskFactory,
        ),
        (
            FilterTask::ELEMENT,
            (|element: &Element| FilterTask::deserialize(element).map(Task::Filter))
                as TaskFactory,
        ),
    ])
}

/// A configuration task of one of the supported kinds
#[derive(Debug, Clone)]
pub enum Task {
    Properties(PropertiesTask),
    Filter(FilterTask),
}

impl Task {
    /// Parse a task element using the kind registry
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` for an unknown element or an
    /// incomplete task definition
    pub fn deserialize(element: &Element) -> Result<Self> {
        let factory = registry()
            .get(element.name.as_str())
            .copied()
            .ok_or_else(|| {
                DeployError::template(format!(
                    "No task handler found for element <{}>",
                    element.name
                ))
            })?;
        factory(element)
    }

    /// The archive entry path this task targets, used as its identity
    #[must_use]
    #[inline]
    pub fn identity(&self) -> &str {
        match self {
            Self::Properties(task) => task.identity(),
            Self::Filter(task) => task.path(),
        }
    }

    /// Serialized element name
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Properties(_) => PropertiesTask::ELEMENT,
            Self::Filter(_) => FilterTask::ELEMENT,
        }
    }

    /// Whether the task writes to an archive entry at all
    #[must_use]
    #[inline]
    pub fn targets_entry(&self) -> bool {
        match self {
            Self::Properties(task) => task.path().is_some(),
            Self::Filter(_) => true,
        }
    }

    #[must_use]
    #[inline]
    pub fn serialize(&self) -> Element {
        match self {
            Self::Properties(task) => task.serialize(),
            Self::Filter(task) => task.serialize(),
        }
    }

    /// Absorb a newer definition of the same task
    ///
    /// A definition of another kind replaces this task.
    pub fn merge(&mut self, other: Self) {
        if self.kind() != other.kind() {
            *self = other;
            return;
        }
        match (self, other) {
            (Self::Properties(task), Self::Properties(incoming)) => task.merge(incoming),
            (Self::Filter(task), Self::Filter(incoming)) => task.merge(incoming),
            _ => {}
        }
    }

    /// # Errors
    ///
    /// Returns an error if a referenced group cannot be loaded
    #[inline]
    pub fn is_configured(&self, groups: &mut dyn ConfigGroupManager) -> Result<bool> {
        match self {
            Self::Properties(task) => task.is_configured(groups),
            Self::Filter(task) => task.is_configured(groups),
        }
    }

    /// # Errors
    ///
    /// Returns an error if prompting fails or a group cannot be written
    #[inline]
    pub fn configure_interactively(
        &mut self,
        configurer: &mut dyn InteractiveConfigurer,
        force: bool,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<bool> {
        match self {
            Self::Properties(task) => task.configure_interactively(configurer, force, groups),
            Self::Filter(task) => task.configure_interactively(configurer, force, groups),
        }
    }

    /// # Errors
    ///
    /// Returns an error if a group cannot be loaded or written
    #[inline]
    pub fn publish_group_values(&self, groups: &mut dyn ConfigGroupManager) -> Result<()> {
        match self {
            Self::Properties(task) => task.publish_group_values(groups),
            Self::Filter(task) => task.publish_group_values(groups),
        }
    }

    /// Transform the bytes of one archive entry
    ///
    /// # Errors
    ///
    /// Returns an error if reading, writing or group lookup fails
    #[inline]
    pub fn apply(
        &self,
        source: &mut dyn Read,
        destination: &mut dyn Write,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<()> {
        match self {
            Self::Properties(task) => task.apply(source, destination, groups),
            Self::Filter(task) => task.apply(source, destination, groups),
        }
    }
}

impl PartialEq for Task {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Task {}

impl Hash for Task {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

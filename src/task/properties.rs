//! Properties task: generates an ISO-8859-1 `.properties` file

use super::item::ConfigItem;
use crate::config::xml::Element;
use crate::error::DeployError;
use crate::group::ConfigGroupManager;
use crate::interactive::InteractiveConfigurer;
use crate::utils::properties::encode_latin1;
use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use tracing::{debug, warn};

const ELEMENT_PROPERTY: &str = "property";
const ATTRIBUTE_PATH: &str = "path";

/// A single generated property, identified by its name
#[derive(Debug, Clone)]
pub struct Property {
    pub item: ConfigItem,
}

impl Property {
    #[must_use]
    #[inline]
    pub const fn new(item: ConfigItem) -> Self {
        Self { item }
    }

    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.item.name
    }
}

impl PartialEq for Property {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.item.name == other.item.name
    }
}

impl Eq for Property {}

impl Hash for Property {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.name.hash(state);
    }
}

/// Writes `name=value` lines for its active properties
///
/// A task without a path only exists to populate config groups and is
/// never applied to an archive entry.
#[derive(Debug, Clone, Default)]
pub struct PropertiesTask {
    path: Option<String>,
    properties: IndexMap<String, Property>,
}

impl PropertiesTask {
    /// Serialized element name
    pub const ELEMENT: &'static str = "properties";

    /// Identity of a task without a path
    pub const NO_PATH: &'static str = "deployconf.properties-task.no-path";

    #[must_use]
    #[inline]
    pub fn new(path: Option<String>) -> Self {
        Self {
            path,
            properties: IndexMap::new(),
        }
    }

    #[must_use]
    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    #[inline]
    pub fn identity(&self) -> &str {
        self.path.as_deref().unwrap_or(Self::NO_PATH)
    }

    #[inline]
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    #[must_use]
    #[inline]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    #[inline]
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    /// Add a property; an existing property with the same name is kept
    #[inline]
    pub fn add_property(&mut self, property: Property) -> bool {
        if self.properties.contains_key(property.name()) {
            return false;
        }
        self.properties.insert(property.name().to_owned(), property);
        true
    }

    /// Parse a `<properties>` element
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when a property lacks a name or a
    /// description, or an unexpected child element is found
    pub fn deserialize(element: &Element) -> Result<Self> {
        let path = element
            .attribute(ATTRIBUTE_PATH)
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(str::to_owned);
        let mut task = Self::new(path);

        for child in &element.children {
            if child.name != ELEMENT_PROPERTY {
                return Err(DeployError::template(format!(
                    "Unexpected <{}> in <{}> for '{}'",
                    child.name,
                    Self::ELEMENT,
                    task.identity()
                ))
                .into());
            }
            let property = Property::new(
                ConfigItem::deserialize(child)
                    .with_context(|| format!("Invalid property in '{}'", task.identity()))?,
            );
            if !task.add_property(property) {
                warn!(
                    "Duplicate property in '{}' ignored: {}",
                    task.identity(),
                    child.child_text("name").unwrap_or_default()
                );
            }
        }

        Ok(task)
    }

    #[must_use]
    pub fn serialize(&self) -> Element {
        let mut element = Element::new(Self::ELEMENT);
        if let Some(path) = &self.path {
            element.set_attribute(ATTRIBUTE_PATH, path.as_str());
        }
        for property in self.properties.values() {
            let mut child = Element::new(ELEMENT_PROPERTY);
            property.item.serialize_into(&mut child, Vec::new());
            element.children.push(child);
        }
        element
    }

    /// Absorb the property metadata of a newer definition of this task
    ///
    /// Values already entered are kept. Properties the newer definition no
    /// longer has are dropped and new ones are appended.
    pub fn merge(&mut self, other: Self) {
        self.properties
            .retain(|name, _| other.properties.contains_key(name));

        for (name, incoming) in other.properties {
            match self.properties.get_mut(&name) {
                Some(existing) => existing.item.absorb(incoming.item),
                None => {
                    self.properties.insert(name, incoming);
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if a referenced group cannot be loaded
    pub fn is_configured(&self, groups: &mut dyn ConfigGroupManager) -> Result<bool> {
        for property in self.properties.values() {
            if !property.item.is_configured(groups)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns an error if prompting fails or a group cannot be written
    pub fn configure_interactively(
        &mut self,
        configurer: &mut dyn InteractiveConfigurer,
        force: bool,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<bool> {
        for property in self.properties.values_mut() {
            if !property.item.configure(configurer, force, groups)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns an error if a group cannot be loaded or written
    pub fn publish_group_values(&self, groups: &mut dyn ConfigGroupManager) -> Result<()> {
        for property in self.properties.values() {
            property.item.publish_group_value(groups)?;
        }
        Ok(())
    }

    /// Write the properties file; the source content is replaced entirely
    ///
    /// # Errors
    ///
    /// Returns an error if a group cannot be loaded or the destination
    /// cannot be written
    pub fn apply(
        &self,
        _source: &mut dyn Read,
        destination: &mut dyn Write,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<()> {
        if self.path.is_none() {
            debug!("Properties task without a path is never applied");
            return Ok(());
        }

        let mut out = String::new();
        for property in self.properties.values() {
            if !property.item.is_active(groups)? {
                continue;
            }

            out.push('\n');
            if let Some(description) = &property.item.description {
                out.push_str("#\n");
                for line in description
                    .trim()
                    .split(['\r', '\n'])
                    .filter(|line| !line.is_empty())
                    .map(str::trim)
                {
                    out.push_str("# ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str("#\n");
            }
            out.push_str(&property.item.name);
            out.push('=');
            out.push_str(&property.item.resolved_value(groups)?);
            out.push('\n');
        }

        destination
            .write_all(&encode_latin1(&out))
            .with_context(|| format!("Failed to write properties for '{}'", self.identity()))?;
        Ok(())
    }
}

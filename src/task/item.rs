//! Fields and behavior shared by properties and filter tokens

use crate::config::xml::Element;
use crate::group::{ConfigGroupManager, resolve_group};
use crate::interactive::InteractiveConfigurer;
use crate::utils::expression::{evaluate_condition, expand_property_expression};
use anyhow::Result;
use tracing::debug;

const ELEMENT_NAME: &str = "name";
const ELEMENT_DESCRIPTION: &str = "description";
const ELEMENT_DEFAULT: &str = "default";
const ELEMENT_CONDITION: &str = "condition";
const ELEMENT_VALUE: &str = "value";
const ATTRIBUTE_GROUP: &str = "group";

/// A named configuration value with its metadata
///
/// Empty strings are normalized to `None` on every field but `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigItem {
    pub name: String,
    pub description: Option<String>,
    pub default_value: Option<String>,
    pub value: Option<String>,
    pub group: Option<String>,
    pub condition: Option<String>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|value| !value.is_empty())
}

impl ConfigItem {
    #[must_use]
    #[inline]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Read the common children and the group attribute of an item element
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when `name` or `description` is missing
    pub fn deserialize(element: &Element) -> Result<Self> {
        Ok(Self {
            name: element.required_child_text(ELEMENT_NAME)?,
            description: Some(element.required_child_text(ELEMENT_DESCRIPTION)?),
            default_value: element.child_text(ELEMENT_DEFAULT),
            value: element.child_text(ELEMENT_VALUE),
            group: non_empty(element.attribute(ATTRIBUTE_GROUP).map(|group| group.trim().to_owned())),
            condition: element.child_text(ELEMENT_CONDITION),
        })
    }

    /// Write the common children into `element`
    ///
    /// `extra` children are placed right after `name`. Grouped items keep
    /// their value in the group store, so `value` is only written without a group.
    pub fn serialize_into(&self, element: &mut Element, extra: Vec<Element>) {
        element
            .children
            .push(Element::with_text(ELEMENT_NAME, Some(self.name.as_str())));
        element.children.extend(extra);
        element.children.push(Element::with_cdata(
            ELEMENT_DESCRIPTION,
            self.description.as_deref(),
        ));
        element.children.push(Element::with_text(
            ELEMENT_DEFAULT,
            self.default_value.as_deref(),
        ));
        element.children.push(Element::with_text(
            ELEMENT_CONDITION,
            self.condition.as_deref(),
        ));

        match &self.group {
            Some(group) => element.set_attribute(ATTRIBUTE_GROUP, group.as_str()),
            None => element
                .children
                .push(Element::with_text(ELEMENT_VALUE, self.value.as_deref())),
        }
    }

    /// Take the metadata of a newer definition while keeping the current value
    #[inline]
    pub fn absorb(&mut self, other: Self) {
        self.description = other.description;
        self.default_value = other.default_value;
        self.group = other.group;
        self.condition = other.condition;
    }

    /// Whether the item's condition holds against its group
    ///
    /// # Errors
    ///
    /// Returns an error if the item's group cannot be loaded
    #[inline]
    pub fn is_active(&self, groups: &mut dyn ConfigGroupManager) -> Result<bool> {
        let group = resolve_group(groups, self.group.as_deref())?;
        Ok(evaluate_condition(self.condition.as_deref(), group))
    }

    /// The group's value when the item is grouped and the group has one,
    /// otherwise the inline value
    ///
    /// # Errors
    ///
    /// Returns an error if the item's group cannot be loaded
    pub fn effective_value(&self, groups: &mut dyn ConfigGroupManager) -> Result<Option<String>> {
        if let Some(group) = &self.group {
            let stored = non_empty(groups.lookup_group(group)?.property(&self.name));
            if stored.is_some() {
                return Ok(stored);
            }
        }
        Ok(non_empty(self.value.clone()))
    }

    /// Inactive items are always configured; active ones need a non-empty value
    ///
    /// # Errors
    ///
    /// Returns an error if the item's group cannot be loaded
    #[inline]
    pub fn is_configured(&self, groups: &mut dyn ConfigGroupManager) -> Result<bool> {
        if !self.is_active(groups)? {
            return Ok(true);
        }
        Ok(self.effective_value(groups)?.is_some())
    }

    /// The effective value with `${name}` references expanded against the group
    ///
    /// # Errors
    ///
    /// Returns an error if the item's group cannot be loaded
    #[inline]
    pub fn resolved_value(&self, groups: &mut dyn ConfigGroupManager) -> Result<String> {
        let value = self.effective_value(groups)?.unwrap_or_default();
        let group = resolve_group(groups, self.group.as_deref())?;
        Ok(expand_property_expression(&value, group))
    }

    /// Ask for a value when the item is active and `force` is set or no value exists
    ///
    /// Returns `false` when the configurer gives no answer. An answer is stored
    /// inline and, for grouped items, in the group.
    ///
    /// # Errors
    ///
    /// Returns an error if prompting fails or the group cannot be written
    pub fn configure(
        &mut self,
        configurer: &mut dyn InteractiveConfigurer,
        force: bool,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<bool> {
        if !self.is_active(groups)? {
            return Ok(true);
        }

        let current = self.effective_value(groups)?;
        if !force && current.is_some() {
            return Ok(true);
        }

        debug!("Configure interactively: {}", self.name);
        let proposed = current.or_else(|| self.default_value.clone());
        let answer = non_empty(configurer.configure(
            &self.name,
            self.description.as_deref(),
            proposed.as_deref(),
        )?);
        debug!("Configure interactively result for '{}': {answer:?}", self.name);

        let Some(answer) = answer else {
            return Ok(false);
        };

        if let Some(group) = &self.group {
            groups
                .lookup_group(group)?
                .set_property(&self.name, Some(answer.as_str()))?;
        }
        self.value = Some(answer);
        Ok(true)
    }

    /// Seed the group with the inline value unless the group already has one
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be loaded or written
    pub fn publish_group_value(&self, groups: &mut dyn ConfigGroupManager) -> Result<()> {
        let (Some(group), Some(value)) = (&self.group, &self.value) else {
            return Ok(());
        };
        if value.is_empty() {
            return Ok(());
        }

        let group_store = groups.lookup_group(group)?;
        if non_empty(group_store.property(&self.name)).is_none() {
            debug!("Populating group {group} with value of {}: {value}", self.name);
            group_store.set_property(&self.name, Some(value.as_str()))?;
        }
        Ok(())
    }
}

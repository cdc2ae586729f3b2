//! In-memory config groups

use super::{ConfigGroup, ConfigGroupManager};
use anyhow::Result;
use std::collections::HashMap;

/// Config group backed by a `HashMap`
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigGroup {
    properties: HashMap<String, String>,
}

impl ConfigGroup for MemoryConfigGroup {
    #[inline]
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    #[inline]
    fn set_property(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                self.properties.insert(name.to_owned(), value.to_owned());
            }
            None => {
                self.properties.remove(name);
            }
        }
        Ok(())
    }
}

/// Manager that keeps every group in memory for the life of the manager
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigGroupManager {
    groups: HashMap<String, MemoryConfigGroup>,
}

impl MemoryConfigGroupManager {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the groups created so far
    #[must_use]
    #[inline]
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ConfigGroupManager for MemoryConfigGroupManager {
    #[inline]
    fn lookup_group(&mut self, name: &str) -> Result<&mut dyn ConfigGroup> {
        Ok(self.groups.entry(name.to_owned()).or_default())
    }
}

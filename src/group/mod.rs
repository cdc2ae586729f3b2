//! Config groups
//!
//! A config group is a named, flat string map shared by every task item that
//! references it. One answer stored in a group satisfies all of those items,
//! across deployment targets.

pub mod filesystem;
pub mod memory;

use anyhow::Result;

pub use filesystem::{FileSystemConfigGroup, FileSystemConfigGroupManager};
pub use memory::{MemoryConfigGroup, MemoryConfigGroupManager};

/// A named key-value property store
pub trait ConfigGroup {
    /// Get the value stored under `name`
    fn property(&self, name: &str) -> Option<String>;

    /// Store `value` under `name`, or remove the key when `value` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written
    fn set_property(&mut self, name: &str, value: Option<&str>) -> Result<()>;
}

/// Lazily creates and caches config groups by name
pub trait ConfigGroupManager {
    /// Get the group called `name`, loading or creating it on first use
    ///
    /// A group is loaded at most once per manager.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing group cannot be loaded
    fn lookup_group(&mut self, name: &str) -> Result<&mut dyn ConfigGroup>;
}

/// Read-only group used for items that reference no group
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGroup;

impl ConfigGroup for EmptyGroup {
    #[inline]
    fn property(&self, _name: &str) -> Option<String> {
        None
    }

    #[inline]
    fn set_property(&mut self, _name: &str, _value: Option<&str>) -> Result<()> {
        Ok(())
    }
}

static EMPTY_GROUP: EmptyGroup = EmptyGroup;

/// Resolve an optional group name to the group used for reads
///
/// # Errors
///
/// Returns an error if the named group cannot be loaded
#[inline]
pub fn resolve_group<'g>(
    groups: &'g mut dyn ConfigGroupManager,
    name: Option<&str>,
) -> Result<&'g dyn ConfigGroup> {
    match name {
        Some(name) => {
            let group: &'g mut dyn ConfigGroup = groups.lookup_group(name)?;
            Ok(group)
        }
        None => Ok(&EMPTY_GROUP),
    }
}

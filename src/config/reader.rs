//! Deployment document loading and parsing

use super::DeploymentConfig;
use super::xml::Element;
use crate::error::DeployError;
use crate::system::System;
use crate::task::Task;
use anyhow::{Context as _, Result};
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Root element of deployment documents
pub const ROOT_ELEMENT: &str = "deployconf";

/// Attribute holding the configuration name
pub const ATTRIBUTE_NAME: &str = "name";

/// Reads `DeploymentConfig`s from XML documents
///
/// Parsing is pure: it never reads or writes config groups.
pub struct DeploymentReader;

impl DeploymentReader {
    /// Parse a deployment document
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when the document is malformed, has
    /// an unexpected root, an unknown task element or an incomplete task
    pub fn parse(document: &str) -> Result<DeploymentConfig> {
        let root = Element::parse(document)?;
        if root.name != ROOT_ELEMENT {
            return Err(DeployError::template(format!(
                "Expected <{ROOT_ELEMENT}> as document root, found <{}>",
                root.name
            ))
            .into());
        }

        let name = root
            .attribute(ATTRIBUTE_NAME)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let mut config = DeploymentConfig::new(name);

        for element in &root.children {
            let task = Task::deserialize(element)?;
            let identity = task.identity().to_owned();
            if !config.add_task(task) {
                warn!("Task path defined more than once, keeping the first: {identity}");
            }
        }

        Ok(config)
    }

    /// Read and parse a deployment document from a stream
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be read or is not valid UTF-8,
    /// or the document is invalid
    pub fn read(source: &mut dyn Read) -> Result<DeploymentConfig> {
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .context("Failed to read deployment document")?;
        let document = String::from_utf8(bytes)
            .map_err(|err| DeployError::template(format!("Document is not valid UTF-8: {err}")))?;
        Self::parse(&document)
    }

    /// Load and parse a deployment document from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the document is invalid
    pub fn load(system: &dyn System, path: &Path) -> Result<DeploymentConfig> {
        let document = system.read_to_string(path).map_err(|err| {
            DeployError::filesystem(format!(
                "Failed to read deployment config {}: {err}",
                path.display()
            ))
        })?;
        Self::parse(&document)
            .with_context(|| format!("Invalid deployment config: {}", path.display()))
    }
}

//! Deployment document rendering

use super::DeploymentConfig;
use super::reader::{ATTRIBUTE_NAME, ROOT_ELEMENT};
use super::xml::Element;
use anyhow::{Context as _, Result};
use std::io::Write;

/// Writes `DeploymentConfig`s as XML documents
pub struct DeploymentWriter;

impl DeploymentWriter {
    /// Build the document tree for a configuration
    #[must_use]
    pub fn to_element(config: &DeploymentConfig) -> Element {
        let mut root = Element::new(ROOT_ELEMENT);
        if let Some(name) = config.name() {
            root.set_attribute(ATTRIBUTE_NAME, name);
        }
        root.children
            .extend(config.tasks().iter().map(crate::task::Task::serialize));
        root
    }

    /// Render a configuration as a document
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails
    #[inline]
    pub fn render(config: &DeploymentConfig) -> Result<String> {
        Self::to_element(config).to_document()
    }

    /// Render a configuration into a stream
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails
    pub fn write(out: &mut dyn Write, config: &DeploymentConfig) -> Result<()> {
        let document = Self::render(config)?;
        out.write_all(document.as_bytes())
            .context("Failed to write deployment document")?;
        out.flush().context("Failed to flush deployment document")
    }
}

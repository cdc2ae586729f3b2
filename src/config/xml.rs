//! Minimal XML element tree for deployment documents
//!
//! Deployment documents are small, so they are read into an owned tree of
//! `Element`s with `quick-xml` and written back from one.

use crate::error::DeployError;
use anyhow::{Context as _, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// An XML element with its attributes, child elements and text content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
    /// Write `text` as a CDATA section
    pub cdata: bool,
}

impl Element {
    #[must_use]
    #[inline]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Leaf element holding `text`, empty when `text` is `None`
    #[must_use]
    #[inline]
    pub fn with_text<S: Into<String>>(name: S, text: Option<&str>) -> Self {
        let mut element = Self::new(name);
        element.text = text.unwrap_or_default().to_owned();
        element
    }

    /// Leaf element whose text is written as CDATA
    #[must_use]
    #[inline]
    pub fn with_cdata<S: Into<String>>(name: S, text: Option<&str>) -> Self {
        let mut element = Self::with_text(name, text);
        element.cdata = true;
        element
    }

    #[inline]
    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(name, _)| *name == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    #[must_use]
    #[inline]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// First child element called `name`
    #[must_use]
    #[inline]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Trimmed text of the child `name`, `None` when missing or empty
    #[must_use]
    #[inline]
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    }

    /// Trimmed text of a child that must be present and non-empty
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when the child is missing or empty
    #[inline]
    pub fn required_child_text(&self, name: &str) -> Result<String> {
        self.child_text(name).ok_or_else(|| {
            DeployError::template(format!(
                "<{}> is missing a required <{name}> element",
                self.name
            ))
            .into()
        })
    }

    /// Parse a document and return its root element
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when the document is not well formed
    pub fn parse(document: &str) -> Result<Self> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Self> = Vec::new();
        let mut root: Option<Self> = None;

        loop {
            let event = reader.read_event().map_err(|err| {
                DeployError::template(format!(
                    "Malformed XML at position {}: {err}",
                    reader.error_position()
                ))
            })?;

            match event {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let unescaped = text
                        .unescape()
                        .map_err(|err| DeployError::template(format!("Invalid XML text: {err}")))?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|err| DeployError::template(format!("Invalid CDATA: {err}")))?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(text);
                        top.cdata = true;
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| DeployError::template("Unbalanced closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(DeployError::template("Unexpected end of document").into());
        }
        root.ok_or_else(|| DeployError::template("Document has no root element").into())
    }

    /// Render the element as a document with an XML declaration
    ///
    /// Output uses four space indentation, `\n` line endings and explicit
    /// closing tags for empty elements.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the in-memory buffer fails
    pub fn to_document(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .context("Failed to write XML declaration")?;
        self.write_to(&mut writer)?;

        let mut document =
            String::from_utf8(writer.into_inner()).context("Rendered XML is not UTF-8")?;
        document.push('\n');
        Ok(document)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|err| DeployError::template(format!("Invalid element name: {err}")))?
            .to_owned();
        let mut element = Self::new(name);

        for attribute in start.attributes() {
            let attribute = attribute
                .map_err(|err| DeployError::template(format!("Invalid attribute: {err}")))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|err| DeployError::template(format!("Invalid attribute name: {err}")))?
                .to_owned();
            let value = attribute
                .unescape_value()
                .map_err(|err| DeployError::template(format!("Invalid attribute value: {err}")))?
                .into_owned();
            element.attributes.push((key, value));
        }

        Ok(element)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer
            .write_event(Event::Start(start))
            .with_context(|| format!("Failed to write <{}>", self.name))?;

        if self.children.is_empty() {
            // A text event keeps the closing tag on the same line
            let content = if self.cdata && !self.text.contains("]]>") {
                Event::CData(BytesCData::new(self.text.as_str()))
            } else {
                Event::Text(BytesText::new(&self.text))
            };
            writer
                .write_event(content)
                .with_context(|| format!("Failed to write content of <{}>", self.name))?;
        } else {
            for child in &self.children {
                child.write_to(writer)?;
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .with_context(|| format!("Failed to write </{}>", self.name))?;
        Ok(())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(DeployError::template("Document has more than one root element").into());
    }
    *root = Some(element);
    Ok(())
}

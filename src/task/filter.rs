//! Filter task: line-oriented regex substitution in a text entry

use super::item::ConfigItem;
use crate::config::xml::Element;
use crate::error::DeployError;
use crate::group::ConfigGroupManager;
use crate::interactive::InteractiveConfigurer;
use anyhow::{Context as _, Result};
use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE};
use std::borrow::Cow;
use indexmap::IndexMap;
use regex::{NoExpand, Regex};
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use tracing::{debug, warn};

const ELEMENT_TOKEN: &str = "token";
const ELEMENT_REGEX: &str = "regex";
const ATTRIBUTE_PATH: &str = "path";
const ATTRIBUTE_ENCODING: &str = "encoding";

/// Default text encoding of filtered entries
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// A regex whose matches are replaced by the token's value
#[derive(Debug, Clone)]
pub struct FilterToken {
    pub item: ConfigItem,
    pub regex: Regex,
}

impl FilterToken {
    #[must_use]
    #[inline]
    pub const fn new(item: ConfigItem, regex: Regex) -> Self {
        Self { item, regex }
    }

    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.item.name
    }

    fn deserialize(element: &Element) -> Result<Self> {
        let item = ConfigItem::deserialize(element)?;
        let pattern = element.required_child_text(ELEMENT_REGEX)?;
        let regex = Regex::new(&pattern).map_err(|err| {
            DeployError::template(format!("Invalid regex for token '{}': {err}", item.name))
        })?;
        Ok(Self::new(item, regex))
    }
}

impl PartialEq for FilterToken {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.item.name == other.item.name
    }
}

impl Eq for FilterToken {}

impl Hash for FilterToken {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.name.hash(state);
    }
}

/// Replaces token matches line by line in the entry at `path`
#[derive(Debug, Clone)]
pub struct FilterTask {
    path: String,
    encoding: String,
    tokens: IndexMap<String, FilterToken>,
}

impl FilterTask {
    /// Serialized element name
    pub const ELEMENT: &'static str = "filter";

    #[must_use]
    #[inline]
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            encoding: DEFAULT_ENCODING.to_owned(),
            tokens: IndexMap::new(),
        }
    }

    /// Set the text encoding by label
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when the label is unknown or names
    /// an encoding that cannot be written
    #[inline]
    pub fn with_encoding(mut self, label: &str) -> Result<Self> {
        lookup_encoding(label)?;
        label.clone_into(&mut self.encoding);
        Ok(self)
    }

    #[must_use]
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    #[inline]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    #[inline]
    pub fn tokens(&self) -> impl Iterator<Item = &FilterToken> {
        self.tokens.values()
    }

    #[must_use]
    #[inline]
    pub fn token(&self, name: &str) -> Option<&FilterToken> {
        self.tokens.get(name)
    }

    #[inline]
    pub fn token_mut(&mut self, name: &str) -> Option<&mut FilterToken> {
        self.tokens.get_mut(name)
    }

    /// Add a token; an existing token with the same name is kept
    #[inline]
    pub fn add_token(&mut self, token: FilterToken) -> bool {
        if self.tokens.contains_key(token.name()) {
            return false;
        }
        self.tokens.insert(token.name().to_owned(), token);
        true
    }

    /// Parse a `<filter>` element
    ///
    /// # Errors
    ///
    /// Returns a `DeployError::Template` when the path is missing, the
    /// encoding is unknown, or a token is incomplete or has an invalid regex
    pub fn deserialize(element: &Element) -> Result<Self> {
        let path = element
            .attribute(ATTRIBUTE_PATH)
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                DeployError::template(format!(
                    "<{}> is missing the required '{ATTRIBUTE_PATH}' attribute",
                    Self::ELEMENT
                ))
            })?;
        let mut task = Self::new(path);
        if let Some(label) = element.attribute(ATTRIBUTE_ENCODING) {
            task = task.with_encoding(label.trim())?;
        }

        for child in &element.children {
            if child.name != ELEMENT_TOKEN {
                return Err(DeployError::template(format!(
                    "Unexpected <{}> in <{}> for '{}'",
                    child.name,
                    Self::ELEMENT,
                    task.path
                ))
                .into());
            }
            let token = FilterToken::deserialize(child)
                .with_context(|| format!("Invalid token in '{}'", task.path))?;
            if !task.add_token(token) {
                warn!(
                    "Duplicate token in '{}' ignored: {}",
                    task.path,
                    child.child_text("name").unwrap_or_default()
                );
            }
        }

        Ok(task)
    }

    #[must_use]
    pub fn serialize(&self) -> Element {
        let mut element = Element::new(Self::ELEMENT);
        element.set_attribute(ATTRIBUTE_PATH, self.path.as_str());
        element.set_attribute(ATTRIBUTE_ENCODING, self.encoding.as_str());
        for token in self.tokens.values() {
            let mut child = Element::new(ELEMENT_TOKEN);
            let regex = Element::with_text(ELEMENT_REGEX, Some(token.regex.as_str()));
            token.item.serialize_into(&mut child, vec![regex]);
            element.children.push(child);
        }
        element
    }

    /// Absorb the encoding and token metadata of a newer definition
    ///
    /// Values already entered are kept. Tokens the newer definition no
    /// longer has are dropped and new ones are appended.
    pub fn merge(&mut self, other: Self) {
        self.encoding = other.encoding;
        self.tokens.retain(|name, _| other.tokens.contains_key(name));

        for (name, incoming) in other.tokens {
            match self.tokens.get_mut(&name) {
                Some(existing) => {
                    existing.regex = incoming.regex;
                    existing.item.absorb(incoming.item);
                }
                None => {
                    self.tokens.insert(name, incoming);
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if a referenced group cannot be loaded
    pub fn is_configured(&self, groups: &mut dyn ConfigGroupManager) -> Result<bool> {
        for token in self.tokens.values() {
            if !token.item.is_configured(groups)? {
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
        for token in self.tokens.values_mut() {
            if !token.item.configure(configurer, force, groups)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns an error if a group cannot be loaded or written
    pub fn publish_group_values(&self, groups: &mut dyn ConfigGroupManager) -> Result<()> {
        for token in self.tokens.values() {
            token.item.publish_group_value(groups)?;
        }
        Ok(())
    }

    /// Filter the source text into the destination
    ///
    /// Every line is written followed by `\n`, whatever the source line
    /// terminator was. Values are inserted literally.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read, a group cannot be
    /// loaded or the destination cannot be written
    pub fn apply(
        &self,
        source: &mut dyn Read,
        destination: &mut dyn Write,
        groups: &mut dyn ConfigGroupManager,
    ) -> Result<()> {
        let encoding = lookup_encoding(&self.encoding)?;

        let mut replacements = Vec::new();
        for token in self.tokens.values() {
            if token.item.is_active(groups)? {
                replacements.push((&token.regex, token.item.resolved_value(groups)?));
            }
        }

        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read '{}'", self.path))?;
        let (text, malformed) = encoding.decode_without_bom_handling(&bytes);
        if malformed {
            warn!(
                "'{}' is not valid {}, malformed sequences were replaced",
                self.path, self.encoding
            );
        }

        let mut out = String::with_capacity(text.len());
        for line in split_lines(&text) {
            let mut filtered = line.to_owned();
            for (regex, value) in &replacements {
                filtered = regex.replace_all(&filtered, NoExpand(value.as_str())).into_owned();
            }
            out.push_str(&filtered);
            out.push('\n');
        }

        let (encoded, unmappable) = encode(encoding, &out);
        if unmappable {
            warn!(
                "Some characters of '{}' cannot be represented in {}",
                self.path, self.encoding
            );
        }
        destination
            .write_all(&encoded)
            .with_context(|| format!("Failed to write '{}'", self.path))?;
        debug!("Filtered '{}' with {} token(s)", self.path, replacements.len());
        Ok(())
    }
}

fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) if encoding != REPLACEMENT => Ok(encoding),
        Some(_) => Err(DeployError::template(format!("Unsupported encoding: {label}")).into()),
        None => Err(DeployError::template(format!("Unknown encoding: {label}")).into()),
    }
}

/// Encode `text` in `encoding`, flagging characters it cannot represent
///
/// encoding_rs only encodes to ASCII-compatible encodings, so UTF-16 is
/// written by hand.
fn encode<'t>(encoding: &'static Encoding, text: &'t str) -> (Cow<'t, [u8]>, bool) {
    if encoding == UTF_16LE {
        let bytes = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        (Cow::Owned(bytes), false)
    } else if encoding == UTF_16BE {
        let bytes = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        (Cow::Owned(bytes), false)
    } else {
        let (encoded, _, unmappable) = encoding.encode(text);
        (encoded, unmappable)
    }
}

/// Split on `\n`, `\r\n` or `\r`; a trailing terminator adds no empty line
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(end) => {
                lines.push(&rest[..end]);
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }

    lines
}

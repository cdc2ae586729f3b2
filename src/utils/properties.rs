//! `.properties` text format and ISO-8859-1 helpers
//!
//! Parsing follows the usual properties syntax: `#` and `!` comments,
//! `=`, `:` or whitespace between key and value, backslash escapes,
//! `\uXXXX` sequences and backslash line continuations.

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Decode ISO-8859-1 bytes; every byte maps to the code point of the same value
#[must_use]
#[inline]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Encode text as ISO-8859-1, replacing characters outside the charset with `?`
#[must_use]
#[inline]
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

/// Parse ISO-8859-1 encoded properties content
///
/// # Errors
///
/// Returns an error on a malformed `\uXXXX` escape
pub fn parse_properties(bytes: &[u8]) -> Result<BTreeMap<String, String>> {
    let text = decode_latin1(bytes);
    let mut properties = BTreeMap::new();

    for line in logical_lines(&text) {
        let (key, value) = split_entry(&line)?;
        properties.insert(key, value);
    }

    Ok(properties)
}

/// Render properties as ISO-8859-1 bytes, one `key=value` per line, sorted by key
#[must_use]
pub fn render_properties(properties: &BTreeMap<String, String>) -> Vec<u8> {
    let mut out = String::new();
    for (key, value) in properties {
        out.push_str(&escape(key, true));
        out.push('=');
        out.push_str(&escape(value, false));
        out.push('\n');
    }
    // Everything outside printable ASCII was escaped above
    out.into_bytes()
}

const fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{c}')
}

/// Join continued natural lines and drop blank and comment lines
fn logical_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for natural in normalized.split('\n') {
        let trimmed = natural.trim_start_matches(is_blank);

        if !continuing && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }

        let trailing = trimmed.chars().rev().take_while(|&ch| ch == '\\').count();
        if trailing % 2 == 1 {
            current.push_str(&trimmed[..trimmed.len() - 1]);
            continuing = true;
        } else {
            current.push_str(trimmed);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }

    if continuing {
        lines.push(current);
    }

    lines
}

fn split_entry(line: &str) -> Result<(String, String)> {
    let chars: Vec<char> = line.chars().collect();
    let mut index = 0;
    let mut escaped = false;

    while index < chars.len() {
        let ch = chars[index];
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '=' || ch == ':' || is_blank(ch) {
            break;
        }
        index += 1;
    }

    let key: String = chars[..index].iter().collect();

    while index < chars.len() && is_blank(chars[index]) {
        index += 1;
    }
    if index < chars.len() && (chars[index] == '=' || chars[index] == ':') {
        index += 1;
    }
    while index < chars.len() && is_blank(chars[index]) {
        index += 1;
    }

    let value: String = chars[index..].iter().collect();
    Ok((unescape(&key)?, unescape(&value)?))
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    // UTF-16 units from consecutive \uXXXX escapes, so surrogate pairs decode
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            flush_units(&mut units, &mut out)?;
            out.push(ch);
            continue;
        }
        let next = chars.next();
        if next != Some('u') {
            flush_units(&mut units, &mut out)?;
        }
        match next {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u16::from_str_radix(&hex, 16) {
                    Ok(unit) if hex.len() == 4 => units.push(unit),
                    _ => bail!("Malformed \\uxxxx encoding: \\u{hex}"),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    flush_units(&mut units, &mut out)?;
    Ok(out)
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) -> Result<()> {
    if units.is_empty() {
        return Ok(());
    }
    match String::from_utf16(units) {
        Ok(decoded) => out.push_str(&decoded),
        Err(err) => bail!("Malformed \\uxxxx encoding: {err}"),
    }
    units.clear();
    Ok(())
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());

    for (index, ch) in text.chars().enumerate() {
        match ch {
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0_u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04X}");
                }
            }
        }
    }

    out
}

//! Terminal prompts for interactive configuration

use crate::interactive::InteractiveConfigurer;
use anyhow::{Context as _, Result};
use dialoguer::{Error as DialoguerError, Input};
use std::io::ErrorKind;

/// Asks for values on the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleConfigurer;

impl ConsoleConfigurer {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

/// Strip leading whitespace from every line of a description
fn format_description(description: &str) -> String {
    description
        .lines()
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n")
}

impl InteractiveConfigurer for ConsoleConfigurer {
    fn preamble(&mut self) -> Result<()> {
        eprintln!();
        eprintln!("One or more configuration properties needs a value");
        Ok(())
    }

    fn configure(
        &mut self,
        name: &str,
        description: Option<&str>,
        default: Option<&str>,
    ) -> Result<Option<String>> {
        eprintln!();
        if let Some(description) = description {
            eprintln!("{}", format_description(description));
            eprintln!();
        }

        let default = default.map(str::trim).filter(|value| !value.is_empty());

        loop {
            let mut input = Input::<String>::new().with_prompt(name).allow_empty(true);
            if let Some(default) = default {
                input = input.default(default.to_owned());
            }

            let answer = match input.interact_text() {
                Ok(value) => value,
                Err(DialoguerError::IO(err))
                    if matches!(
                        err.kind(),
                        ErrorKind::Interrupted | ErrorKind::UnexpectedEof | ErrorKind::NotConnected
                    ) =>
                {
                    return Ok(None);
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("Failed to read a value for {name}"));
                }
            };

            let value = match answer.trim() {
                "" => default.unwrap_or_default(),
                trimmed => trimmed,
            };
            if !value.is_empty() {
                eprintln!("==> '{value}'");
                return Ok(Some(value.to_owned()));
            }
        }
    }
}

//! Interactive configuration capability

use anyhow::Result;

/// Asks the user for configuration values
pub trait InteractiveConfigurer {
    /// Called once before the first value of an interactive session is asked for
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written
    #[inline]
    fn preamble(&mut self) -> Result<()> {
        Ok(())
    }

    /// Ask for a value of `name`, proposing `default`
    ///
    /// Returns the trimmed, non-empty answer, or `None` when the session was
    /// aborted and no value can be obtained.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written
    fn configure(
        &mut self,
        name: &str,
        description: Option<&str>,
        default: Option<&str>,
    ) -> Result<Option<String>>;
}

//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for deployconf operations
///
/// Exit code 2 is reserved for an incomplete configuration, which is a
/// normal outcome and never an error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeployError {
    /// Template Error - missing, unreadable or malformed template or config document
    #[error("Template error: {message}")]
    Template { message: String },

    /// Archive Error - reading or writing a zip archive failed
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },

    /// Group Error - a config group could not be loaded or stored
    #[error("Config group error: {message}")]
    Group { message: String },
}

impl DeployError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Template { .. } => 3,
            Self::Archive { .. } => 4,
            Self::Filesystem { .. } => 5,
            Self::Group { .. } => 6,
        }
    }

    /// Create a template error
    #[inline]
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an archive error
    #[inline]
    pub fn archive<S: Into<String>>(message: S) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }

    /// Create a config group error
    #[inline]
    pub fn group<S: Into<String>>(message: S) -> Self {
        Self::Group {
            message: message.into(),
        }
    }
}

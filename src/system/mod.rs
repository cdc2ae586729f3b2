//! System abstraction for filesystem operations
//!
//! Every file the tool touches (archives, persisted deployment configs and
//! config group files) goes through this trait so runs can be exercised
//! against an in-memory filesystem.

use std::io::{self, Read, Seek, Write};
use std::path::Path;

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// A readable, seekable stream (zip archives need random access)
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// A writable, seekable stream
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek> WriteSeek for T {}

/// Unified trait for filesystem operations
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::fs`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    /// Read entire file contents as bytes
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write bytes to a file, creating it if it doesn't exist
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Recursively create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Check if a path points to a directory
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Open a file for random-access reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek + '_>>;

    /// Create (or truncate) a file for random-access writing
    fn create(&self, path: &Path) -> io::Result<Box<dyn WriteSeek + '_>>;
}

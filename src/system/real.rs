//! Real system implementation using `std::fs`

use super::{ReadSeek, System, WriteSeek};
use std::fs;
use std::io;
use std::path::Path;

/// Production implementation of System trait
///
/// Delegates straight to the standard library.
#[derive(Debug, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
    /// Create a new `RealSystem` instance
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RealSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RealSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(path.is_dir())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek + '_>> {
        let file = fs::File::open(path)?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn WriteSeek + '_>> {
        let file = fs::File::create(path)?;
        Ok(Box::new(io::BufWriter::new(file)))
    }
}

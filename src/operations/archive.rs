//! Zip archive streaming
//!
//! Copies a source archive into a new destination archive, dropping the
//! template entry and passing entries that tasks target through those tasks.

use crate::error::DeployError;
use crate::group::ConfigGroupManager;
use crate::task::Task;
use anyhow::{Context as _, Result};
use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use tracing::{debug, warn};
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::write::{FullFileOptions, SimpleFileOptions};
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Read a single entry of an archive, `None` when the entry does not exist
///
/// # Errors
///
/// Returns a `DeployError::Archive` when the source is not a readable zip archive
pub fn read_entry<R: Read + Seek>(source: R, path: &str) -> Result<Option<Vec<u8>>> {
    let mut archive = ZipArchive::new(source)
        .map_err(|err| DeployError::archive(format!("Failed to open archive: {err}")))?;

    let mut entry = match archive.by_name(path) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => {
            return Err(DeployError::archive(format!("Failed to read entry {path}: {err}")).into());
        }
    };

    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .map_err(|err| DeployError::archive(format!("Failed to read entry {path}: {err}")))?;
    Ok(Some(content))
}

/// Copy `source` into `destination`, applying tasks to the entries they target
///
/// Entries without tasks and without extra fields are copied raw, keeping
/// their compressed data and comment. Every other entry is written afresh
/// with the source entry's name, comment, extra fields, timestamp,
/// permissions and compression. `ignored_entry` is left out. The destination
/// archive is only finished once every entry has been written.
///
/// # Errors
///
/// Returns a `DeployError::Archive` on zip failures, or the error of a
/// failing task
pub fn rewrite_archive<R: Read + Seek, W: Write + Seek>(
    source: R,
    destination: W,
    ignored_entry: &str,
    tasks: &[Task],
    groups: &mut dyn ConfigGroupManager,
) -> Result<W> {
    let mut archive = ZipArchive::new(source)
        .map_err(|err| DeployError::archive(format!("Failed to open source archive: {err}")))?;
    let mut writer = ZipWriter::new(destination);

    let mut tasks_by_path: HashMap<&str, Vec<&Task>> = HashMap::new();
    for task in tasks.iter().filter(|task| task.targets_entry()) {
        tasks_by_path.entry(task.identity()).or_default().push(task);
    }

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| DeployError::archive(format!("Failed to read entry #{index}: {err}")))?;
        let name = entry.name().to_owned();

        if name == ignored_entry {
            debug!("Skipping template entry: {name}");
            continue;
        }

        let entry_tasks = tasks_by_path.get(name.as_str()).map_or(&[][..], Vec::as_slice);
        let has_extra = entry.extra_data().is_some_and(|extra| !extra.is_empty());
        if entry_tasks.is_empty() && !has_extra {
            debug!("Copying entry: {name}");
            writer
                .raw_copy_file(entry)
                .map_err(|err| DeployError::archive(format!("Failed to copy {name}: {err}")))?;
            continue;
        }

        if entry_tasks.is_empty() {
            debug!("Rewriting entry to keep its extra fields: {name}");
        } else {
            debug!("Applying {} task(s) to entry: {name}", entry_tasks.len());
        }
        let options = entry_options(&entry);

        if entry.is_dir() {
            drop(entry);
            writer
                .add_directory(name.as_str(), options)
                .map_err(|err| DeployError::archive(format!("Failed to add {name}: {err}")))?;
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|err| DeployError::archive(format!("Failed to read {name}: {err}")))?;
        drop(entry);

        for task in entry_tasks {
            let mut transformed = Vec::new();
            task.apply(&mut content.as_slice(), &mut transformed, groups)
                .with_context(|| format!("Failed to apply {} task to {name}", task.kind()))?;
            content = transformed;
        }

        writer
            .start_file(name.as_str(), options)
            .map_err(|err| DeployError::archive(format!("Failed to add {name}: {err}")))?;
        writer
            .write_all(&content)
            .map_err(|err| DeployError::archive(format!("Failed to write {name}: {err}")))?;
    }

    writer
        .finish()
        .map_err(|err| DeployError::archive(format!("Failed to finish archive: {err}")).into())
}

/// Options for a fresh entry mirroring the metadata of `entry`
fn entry_options<R: Read>(entry: &ZipFile<'_, R>) -> FullFileOptions<'static> {
    let mut options = SimpleFileOptions::default()
        .compression_method(match entry.compression() {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        })
        .into_full_options();
    if let Some(modified) = entry.last_modified() {
        options = options.last_modified_time(modified);
    }
    if let Some(mode) = entry.unix_mode() {
        options = options.unix_permissions(mode);
    }
    if !entry.comment().is_empty() {
        options = options.with_file_comment(entry.comment());
    }

    let mut extra = entry.extra_data().unwrap_or_default();
    while let [id_low, id_high, len_low, len_high, rest @ ..] = extra {
        let header_id = u16::from_le_bytes([*id_low, *id_high]);
        let len = usize::from(u16::from_le_bytes([*len_low, *len_high]));
        let Some((data, remaining)) = rest.split_at_checked(len) else {
            warn!("Truncated extra field {header_id:#06x} dropped from {}", entry.name());
            break;
        };
        if let Err(err) = options.add_extra_data(header_id, data, false) {
            warn!("Extra field {header_id:#06x} dropped from {}: {err}", entry.name());
        }
        extra = remaining;
    }

    options
}

//! Directory copy.

use std::fs::{self, DirEntry};
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::RuntimeError;
use crate::log_args;
use crate::logging::Logger;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Descend into subdirectories, recreating them under the destination.
    pub recursive: bool,
    /// Replace files that already exist at the destination.
    pub overwrite: bool,
}

/// Copy the files of `source` into `destination`; returns how many were copied.
///
/// Fails with `RuntimeError::DirectoryNotFound` when `source` is missing and
/// with `RuntimeError::DestinationExists` when a target file exists and
/// `overwrite` is off. Runs as a scoped operation.
pub fn copy_directory(
    log: &Logger,
    source: &Path,
    destination: &Path,
    options: CopyOptions,
) -> Result<usize> {
    let mut op = log.begin("Copying {0} to {1}", log_args![source, destination]);
    if !source.is_dir() {
        let full = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        return Err(RuntimeError::DirectoryNotFound(full).into());
    }

    let copied = copy_tree(log, source, destination, options)?;
    log.debug("Copied {0} files from {1}.", log_args![copied, source]);
    op.complete();
    Ok(copied)
}

fn copy_tree(log: &Logger, source: &Path, destination: &Path, options: CopyOptions) -> Result<usize> {
    // Listing is taken before anything is created, so a destination nested
    // inside the source is never copied into itself.
    let (files, dirs) = list_entries(source)?;

    fs::create_dir_all(destination)
        .with_context(|| format!("create directory {}", destination.display()))?;

    let mut copied = 0;
    for entry in files {
        let target = destination.join(entry.file_name());
        if !options.overwrite && target.exists() {
            return Err(RuntimeError::DestinationExists(target).into());
        }
        fs::copy(entry.path(), &target).with_context(|| {
            format!("copy {} to {}", entry.path().display(), target.display())
        })?;
        log.debug("Copied {0} to {1}.", log_args![entry.path(), &target]);
        copied += 1;
    }

    if options.recursive {
        for dir in dirs {
            copied += copy_tree(log, &dir.path(), &destination.join(dir.file_name()), options)?;
        }
    }
    Ok(copied)
}

fn list_entries(dir: &Path) -> Result<(Vec<DirEntry>, Vec<DirEntry>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if file_type.is_dir() {
            dirs.push(entry);
        } else if entry.path().is_file() {
            files.push(entry);
        }
    }
    files.sort_by_key(DirEntry::file_name);
    dirs.sort_by_key(DirEntry::file_name);
    Ok((files, dirs))
}

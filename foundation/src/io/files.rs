//! Pattern-based file enumeration and deletion.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::log_args;
use crate::logging::Logger;

/// Returned by [`delete_files`] when the search path does not exist.
pub const PATH_NOT_FOUND: i64 = -1;

/// Behavior of [`delete_files`] when a single file cannot be removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Stop and return the first error.
    #[default]
    AbortOnFirstError,
    /// Log the failure and keep deleting.
    ContinueOnError,
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    let mut glob = GlobBuilder::new(pattern);
    glob.literal_separator(true);
    if cfg!(windows) {
        glob.case_insensitive(true);
    }
    Ok(glob.build()?.compile_matcher())
}

/// Files under `path` whose name matches the shell-style `pattern`.
///
/// With `recurse` the whole subtree is searched, otherwise only immediate
/// children. A missing `path` or an invalid pattern is logged as an error and
/// yields an empty list. Results are ordered by path.
pub fn get_files(log: &Logger, pattern: &str, path: &Path, recurse: bool) -> Vec<PathBuf> {
    if !path.is_dir() {
        log.error("The path {0} does not exist.", log_args![path]);
        return Vec::new();
    }
    let matcher = match build_matcher(pattern) {
        Ok(matcher) => matcher,
        Err(err) => {
            log.error_with(&err, "Invalid file pattern {0}.", log_args![pattern]);
            return Vec::new();
        }
    };

    let max_depth = if recurse { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log.warn(
                    "Skipping unreadable entry under {0}: {1}",
                    log_args![path, err.to_string()],
                );
                continue;
            }
        };
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    log.debug(
        "Found {0} files matching {1} in {2}.",
        log_args![files.len(), pattern, path],
    );
    files
}

/// Delete every file [`get_files`] returns; the number removed, or
/// [`PATH_NOT_FOUND`] when `path` does not exist.
pub fn delete_files(
    log: &Logger,
    pattern: &str,
    path: &Path,
    recurse: bool,
    policy: DeletePolicy,
) -> Result<i64> {
    if !path.is_dir() {
        log.error("The path {0} does not exist.", log_args![path]);
        return Ok(PATH_NOT_FOUND);
    }

    let mut deleted = 0i64;
    for file in get_files(log, pattern, path, recurse) {
        match fs::remove_file(&file) {
            Ok(()) => {
                deleted += 1;
                log.debug("Deleted {0}.", log_args![&file]);
            }
            Err(err) => match policy {
                DeletePolicy::AbortOnFirstError => {
                    return Err(err).with_context(|| format!("delete {}", file.display()));
                }
                DeletePolicy::ContinueOnError => {
                    log.error_with(&err, "Could not delete {0}.", log_args![&file]);
                }
            },
        }
    }
    Ok(deleted)
}

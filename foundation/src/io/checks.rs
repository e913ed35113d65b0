//! Small precondition helpers shared by commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::RuntimeError;
use crate::log_args;
use crate::logging::Logger;

/// `path` back if it exists as a file, `RuntimeError::FileNotFound` otherwise.
///
/// `http://` and `https://` values are remote and skip the check.
pub fn fail_if_file_does_not_exist(path: &str) -> Result<&str, RuntimeError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path);
    }
    if !Path::new(path).is_file() {
        return Err(RuntimeError::FileNotFound(path.into()));
    }
    Ok(path)
}

/// Warn that `path` is about to be overwritten.
pub fn warn_if_file_exists<'a>(log: &Logger, path: &'a Path) -> &'a Path {
    if path.is_file() {
        log.warn("File {0} exists, overwriting...", log_args![path]);
    }
    path
}

pub fn create_if_directory_does_not_exist(path: &Path) -> Result<&Path> {
    if !path.is_dir() {
        fs::create_dir_all(path)
            .with_context(|| format!("create directory {}", path.display()))?;
    }
    Ok(path)
}

/// Fails on the first `None`, reporting its index.
pub fn verify_present<T>(values: &[Option<T>]) -> Result<(), RuntimeError> {
    match values.iter().position(Option::is_none) {
        Some(index) => Err(RuntimeError::MissingArgument { index }),
        None => Ok(()),
    }
}

/// Random lowercase alphanumeric string of `len` characters.
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(len)
        .collect::<String>()
        .to_lowercase()
}

//! Subcommand implementations.
//!
//! Each command reports through the runtime's logger and prints its result to
//! stdout. Conditions with a dedicated exit code are mapped here; everything
//! else propagates as an error and becomes [`exit_codes::FAILED`].

use std::path::Path;

use anyhow::{Context, Result};
use foundation::config::FoundationConfig;
use foundation::identity;
use foundation::io::{
    CopyOptions, DeletePolicy, Downloader, PATH_NOT_FOUND, copy_directory, delete_files,
    get_files, get_relative_path, view_file_path,
};
use foundation::logging::log_file_path;
use foundation::{Runtime, RuntimeError};
use serde_json::json;
use url::Url;

use crate::exit_codes;

/// Print the runtime identity and well-known locations as JSON.
pub fn info(runtime: &Runtime, log_dir: Option<&Path>) -> Result<i32> {
    let cwd = identity::current_dir()?;
    let report = json!({
        "version": identity::version(),
        "identity": runtime.identity(),
        "current_dir": cwd,
        "exe_dir": identity::exe_dir(),
        "data_dir": identity::tool_data_dir(),
        "run_file": runtime.run_file(),
        "log_file": log_file_path(runtime.tool_name(), runtime.log_name(), log_dir),
    });
    let rendered = serde_json::to_string_pretty(&report).context("serialize info")?;
    println!("{rendered}");
    Ok(exit_codes::OK)
}

/// List files matching `pattern` under `path`, one per line.
pub fn files(runtime: &Runtime, pattern: &str, path: &Path, recurse: bool) -> Result<i32> {
    let found = get_files(runtime.logger(), pattern, path, recurse);
    if !path.is_dir() {
        return Ok(exit_codes::NOT_FOUND);
    }
    let base = path.to_string_lossy();
    for file in &found {
        println!(
            "{}",
            view_file_path(
                &file.to_string_lossy(),
                Some(&base),
                runtime.debug_enabled()
            )
        );
    }
    Ok(exit_codes::OK)
}

pub fn delete(
    runtime: &Runtime,
    pattern: &str,
    path: &Path,
    recurse: bool,
    policy: DeletePolicy,
) -> Result<i32> {
    let deleted = delete_files(runtime.logger(), pattern, path, recurse, policy)?;
    if deleted == PATH_NOT_FOUND {
        eprintln!("directory not found: {}", path.display());
        return Ok(exit_codes::NOT_FOUND);
    }
    println!("deleted {deleted} files");
    Ok(exit_codes::OK)
}

pub fn relpath(from: &str, to: &str) -> Result<i32> {
    println!("{}", get_relative_path(from, to));
    Ok(exit_codes::OK)
}

pub fn copy(runtime: &Runtime, source: &Path, dest: &Path, options: CopyOptions) -> Result<i32> {
    match copy_directory(runtime.logger(), source, dest, options) {
        Ok(copied) => {
            println!("copied {copied} files");
            Ok(exit_codes::OK)
        }
        Err(err) => match err.downcast_ref::<RuntimeError>() {
            Some(RuntimeError::DirectoryNotFound(dir)) => {
                eprintln!("directory not found: {}", dir.display());
                Ok(exit_codes::NOT_FOUND)
            }
            _ => Err(err),
        },
    }
}

pub fn download(
    runtime: &Runtime,
    config: &FoundationConfig,
    name: &str,
    url: &str,
    dest: &Path,
) -> Result<i32> {
    let url = Url::parse(url).with_context(|| format!("parse url {url}"))?;
    let downloader = Downloader::new(
        runtime.logger().clone(),
        runtime.cancellation_token(),
        config.download_timeout(),
    )?;
    if downloader.download_file(name, &url, dest)? {
        println!("{}", dest.display());
        Ok(exit_codes::OK)
    } else {
        eprintln!("download of {name} failed; see log for details");
        Ok(exit_codes::FAILED)
    }
}

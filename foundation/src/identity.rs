//! Runtime identity and read-only facts about the host environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;

/// Exclusive upper bound for session ids.
pub const SESSION_ID_LIMIT: u32 = 99_999;

/// Name of the product directory under the local application-data directory.
pub const DATA_DIR_NAME: &str = "foundation";

/// Platform-native path separator as a string.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = "\\";
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = "/";

/// Who is running: fixed at initialization except for `debug_enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeIdentity {
    pub tool_name: String,
    pub log_name: String,
    pub debug_enabled: bool,
    /// Disambiguates concurrent runs of the same tool (e.g. lock-file names).
    pub session_id: u32,
}

/// Draw a session id in `[0, SESSION_ID_LIMIT)`.
pub fn new_session_id() -> u32 {
    rand::thread_rng().gen_range(0..SESSION_ID_LIMIT)
}

pub fn user_home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir()
}

/// Product directory under local application data.
pub fn tool_data_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DATA_DIR_NAME))
}

/// `{tool_data_dir}/{tool_name}.run`.
pub fn run_file(tool_name: &str) -> Option<PathBuf> {
    tool_data_dir().map(|dir| dir.join(format!("{tool_name}.run")))
}

pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("read current directory")
}

/// Directory holding the running executable.
///
/// Falls back to the current directory, then `.`.
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Version of this crate as built.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Run-marker file held for the lifetime of a command; removed on drop.
#[derive(Debug)]
pub struct RunMarker {
    path: PathBuf,
}

impl RunMarker {
    /// Write the marker (session id and process id), creating parent directories.
    pub fn acquire(path: impl Into<PathBuf>, session_id: u32) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create run marker dir {}", parent.display()))?;
        }
        let contents = format!("session_id={session_id}\npid={}\n", std::process::id());
        fs::write(&path, contents)
            .with_context(|| format!("write run marker {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunMarker {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

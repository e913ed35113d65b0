//! JSON configuration file, resolved against the current working directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;
use crate::io::files::DeletePolicy;

/// Tool configuration (JSON).
///
/// Missing fields take their defaults, so an empty object is a valid file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FoundationConfig {
    /// Verbose logging and full paths in user-facing output.
    pub debug: bool,

    /// Directory for log files; the executable's directory when unset.
    pub log_dir: Option<PathBuf>,

    /// Mirror log output to stderr.
    pub console: bool,

    /// What `delete_files` does when one file cannot be removed.
    pub delete_policy: DeletePolicy,

    /// Overwrite existing files when copying directories.
    pub copy_overwrite: bool,

    /// Whole-request timeout for downloads.
    pub download_timeout_secs: u64,
}

impl Default for FoundationConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_dir: None,
            console: false,
            delete_policy: DeletePolicy::default(),
            copy_overwrite: false,
            download_timeout_secs: 5 * 60,
        }
    }
}

impl FoundationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.download_timeout_secs == 0 {
            return Err(anyhow!("download_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Load `path` relative to the current working directory.
pub fn load_config_file(path: &Path, required: bool) -> Result<FoundationConfig> {
    let base = std::env::current_dir().context("read current directory")?;
    load_config_from(&base, path, required)
}

/// Load `path` relative to `base` (absolute paths are used as-is).
///
/// A missing file is an error when `required`, otherwise yields defaults.
pub fn load_config_from(base: &Path, path: &Path, required: bool) -> Result<FoundationConfig> {
    let resolved = base.join(path);
    if !resolved.is_file() {
        if required {
            return Err(RuntimeError::FileNotFound(resolved).into());
        }
        let cfg = FoundationConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(&resolved)
        .with_context(|| format!("read {}", resolved.display()))?;
    let cfg: FoundationConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parse {}", resolved.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

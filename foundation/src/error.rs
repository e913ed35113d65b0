//! Typed failure conditions callers are expected to match on.
//!
//! Functions return `anyhow::Result`; these variants travel inside the
//! `anyhow::Error` and can be recovered with `downcast_ref::<RuntimeError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("source directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("destination file already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// A required argument was absent; `index` is its position in the checked list.
    #[error("argument at index {index} is missing")]
    MissingArgument { index: usize },

    #[error("operation cancelled")]
    Cancelled,
}

//! Stable exit codes for `foundation` commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed: bad arguments, configuration, I/O or a failed download.
pub const FAILED: i32 = 1;
/// The directory a command was pointed at does not exist.
pub const NOT_FOUND: i32 = 2;

//! The logging facade every component writes through.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    /// Critical condition; the process is usually about to go down.
    Fatal,
}

/// A structured template argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Str(value) => f.write_str(value),
            LogValue::I64(value) => write!(f, "{value}"),
            LogValue::U64(value) => write!(f, "{value}"),
            LogValue::F64(value) => write!(f, "{value}"),
            LogValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Str(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Str(value)
    }
}

impl From<&String> for LogValue {
    fn from(value: &String) -> Self {
        LogValue::Str(value.clone())
    }
}

impl From<&Path> for LogValue {
    fn from(value: &Path) -> Self {
        LogValue::Str(value.display().to_string())
    }
}

impl From<&PathBuf> for LogValue {
    fn from(value: &PathBuf) -> Self {
        LogValue::from(value.as_path())
    }
}

impl From<PathBuf> for LogValue {
    fn from(value: PathBuf) -> Self {
        LogValue::from(value.as_path())
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        LogValue::Bool(value)
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::F64(value)
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for LogValue {
            fn from(value: $ty) -> Self {
                LogValue::I64(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for LogValue {
            fn from(value: $ty) -> Self {
                LogValue::U64(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for LogValue {
    fn from(value: usize) -> Self {
        LogValue::U64(value as u64)
    }
}

/// One record as handed to a backend: template and arguments are untouched.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub level: Level,
    pub template: &'a str,
    pub args: &'a [LogValue],
    pub error: Option<&'a (dyn Error + 'static)>,
}

/// Sink for log records. Shared across threads after initialization.
pub trait LogBackend: Send + Sync {
    fn log(&self, record: &LogRecord<'_>);
}

/// Backend that drops every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl LogBackend for NullBackend {
    fn log(&self, _record: &LogRecord<'_>) {}
}

/// Builds the backend installed by [`Runtime::initialize`](crate::Runtime::initialize).
pub trait LoggerFactory {
    /// `category` is the tool name the logger is created for.
    fn create_logger(&self, category: &str) -> Result<Arc<dyn LogBackend>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullLoggerFactory;

impl LoggerFactory for NullLoggerFactory {
    fn create_logger(&self, _category: &str) -> Result<Arc<dyn LogBackend>> {
        Ok(Arc::new(NullBackend))
    }
}

/// Factory handing out an already-built backend.
#[derive(Clone)]
pub struct SharedBackendFactory {
    backend: Arc<dyn LogBackend>,
}

impl SharedBackendFactory {
    pub fn new(backend: Arc<dyn LogBackend>) -> Self {
        Self { backend }
    }
}

impl LoggerFactory for SharedBackendFactory {
    fn create_logger(&self, _category: &str) -> Result<Arc<dyn LogBackend>> {
        Ok(Arc::clone(&self.backend))
    }
}

/// Cheap-to-clone handle over a backend.
#[derive(Clone)]
pub struct Logger {
    backend: Arc<dyn LogBackend>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::null()
    }
}

impl Logger {
    pub fn new(backend: Arc<dyn LogBackend>) -> Self {
        Self { backend }
    }

    /// A logger that swallows everything.
    pub fn null() -> Self {
        Self::new(Arc::new(NullBackend))
    }

    pub fn log(&self, level: Level, template: &str, args: &[LogValue]) {
        self.backend.log(&LogRecord {
            level,
            template,
            args,
            error: None,
        });
    }

    pub fn debug(&self, template: &str, args: &[LogValue]) {
        self.log(Level::Debug, template, args);
    }

    pub fn info(&self, template: &str, args: &[LogValue]) {
        self.log(Level::Info, template, args);
    }

    pub fn warn(&self, template: &str, args: &[LogValue]) {
        self.log(Level::Warn, template, args);
    }

    pub fn error(&self, template: &str, args: &[LogValue]) {
        self.log(Level::Error, template, args);
    }

    pub fn fatal(&self, template: &str, args: &[LogValue]) {
        self.log(Level::Fatal, template, args);
    }

    /// Error record carrying the error value alongside the template.
    pub fn error_with(&self, err: &(dyn Error + 'static), template: &str, args: &[LogValue]) {
        self.backend.log(&LogRecord {
            level: Level::Error,
            template,
            args,
            error: Some(err),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_args;
    use crate::test_support::MemoryBackend;

    #[test]
    fn null_logger_accepts_everything() {
        let log = Logger::null();
        log.info("nothing {0}", log_args!["here"]);
        log.fatal("still nothing", log_args![]);
        let err = std::io::Error::other("boom");
        log.error_with(&err, "ignored", log_args![]);
    }

    #[test]
    fn records_are_forwarded_verbatim() {
        let backend = MemoryBackend::new();
        let log = Logger::new(backend.clone());

        log.warn("File {0} exists, overwriting...", log_args!["a.txt"]);
        log.debug("Received {b} bytes of {t}", log_args![10_u64, 20_u64]);

        let records = backend.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].template, "File {0} exists, overwriting...");
        assert_eq!(records[0].args, vec![LogValue::from("a.txt")]);
        assert_eq!(records[1].level, Level::Debug);
        assert_eq!(records[1].args, vec![LogValue::U64(10), LogValue::U64(20)]);
    }

    #[test]
    fn error_with_carries_error_text() {
        let backend = MemoryBackend::new();
        let log = Logger::new(backend.clone());
        let err = std::io::Error::other("disk gone");

        log.error_with(&err, "Copy of {0} failed.", log_args!["src"]);

        let records = backend.records();
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[0].error.as_deref(), Some("disk gone"));
    }

    #[test]
    fn values_display_like_their_source() {
        assert_eq!(LogValue::from(-3_i32).to_string(), "-3");
        assert_eq!(LogValue::from(7_usize).to_string(), "7");
        assert_eq!(LogValue::from(true).to_string(), "true");
        assert_eq!(LogValue::from(Path::new("a/b")).to_string(), "a/b");
    }
}

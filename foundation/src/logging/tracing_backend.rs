//! `tracing`-based backend behind the convenience initializers.
//!
//! Each backend owns its own [`Dispatch`]; nothing is installed as the
//! process-global subscriber, so several runtimes (or tests) can coexist.

use std::error::Error;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::Dispatch;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt};

use super::facade::{Level, LogBackend, LogRecord, LogValue, LoggerFactory};
use super::template::render;
use crate::identity::exe_dir;

/// `{log_dir}/{tool_name}-{log_name}.log`, defaulting to the executable's directory.
pub fn log_file_path(tool_name: &str, log_name: &str, log_dir: Option<&Path>) -> PathBuf {
    let dir = log_dir.map_or_else(exe_dir, Path::to_path_buf);
    dir.join(format!("{tool_name}-{log_name}.log"))
}

/// Forwards records to a private `tracing` dispatcher.
///
/// The event message is the rendered template; the raw template, the argument
/// list and the error chain ride along as fields so sinks can index on them.
pub struct TracingBackend {
    category: String,
    dispatch: Dispatch,
}

impl TracingBackend {
    pub fn new(category: impl Into<String>, dispatch: Dispatch) -> Self {
        Self {
            category: category.into(),
            dispatch,
        }
    }
}

impl LogBackend for TracingBackend {
    fn log(&self, record: &LogRecord<'_>) {
        let message = render(record.template, record.args);
        let args = ArgList(record.args);
        let error_text = record.error.map(error_chain);
        let error = error_text.as_deref();
        let category = self.category.as_str();
        let template = record.template;

        tracing::dispatcher::with_default(&self.dispatch, || match record.level {
            Level::Debug => tracing::debug!(category, template, args = %args, error, "{message}"),
            Level::Info => tracing::info!(category, template, args = %args, error, "{message}"),
            Level::Warn => tracing::warn!(category, template, args = %args, error, "{message}"),
            Level::Error => tracing::error!(category, template, args = %args, error, "{message}"),
            Level::Fatal => {
                tracing::error!(category, template, args = %args, error, fatal = true, "{message}");
            }
        });
    }
}

struct ArgList<'a>(&'a [LogValue]);

impl fmt::Display for ArgList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                LogValue::Str(s) => write!(f, "{s:?}")?,
                other => write!(f, "{other}")?,
            }
        }
        f.write_str("]")
    }
}

fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// File sink, optionally mirrored to stderr.
///
/// Filter comes from `RUST_LOG` when set, otherwise `debug` or `info`
/// depending on [`TracingLoggerFactory::debug`].
#[derive(Debug, Clone)]
pub struct TracingLoggerFactory {
    pub log_path: PathBuf,
    pub console: bool,
    pub debug: bool,
}

impl TracingLoggerFactory {
    pub fn file(log_path: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            log_path: log_path.into(),
            console: false,
            debug,
        }
    }

    pub fn file_and_console(log_path: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            console: true,
            ..Self::file(log_path, debug)
        }
    }
}

impl LoggerFactory for TracingLoggerFactory {
    fn create_logger(&self, category: &str) -> Result<Arc<dyn LogBackend>> {
        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("open log file {}", self.log_path.display()))?;

        let default_level = if self.debug { "debug" } else { "info" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let console = self.console.then(|| {
            tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(console);

        Ok(Arc::new(TracingBackend::new(
            category,
            Dispatch::new(subscriber),
        )))
    }
}

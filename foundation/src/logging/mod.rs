//! Structured logging facade.
//!
//! # Separation of Concerns
//!
//! - **Facade ([`facade`])**: what the rest of the tool calls. Forwards
//!   `(level, template, args)` verbatim and never formats.
//! - **Backends ([`tracing_backend`])**: where records end up. The bundled
//!   backend renders templates ([`template`]) and writes through `tracing`.
//! - **Operations ([`operation`])**: scoped units of work that log a start
//!   event and exactly one end event.

pub mod facade;
pub mod operation;
pub mod template;
pub mod tracing_backend;

pub use facade::{
    Level, LogBackend, LogRecord, LogValue, Logger, LoggerFactory, NullBackend,
    NullLoggerFactory, SharedBackendFactory,
};
pub use operation::Operation;
pub use tracing_backend::{TracingBackend, TracingLoggerFactory, log_file_path};

/// Build a `&[LogValue]` argument list from heterogeneous values.
///
/// ```
/// use foundation::{Logger, log_args};
///
/// Logger::null().info("Copied {0} files to {1}", log_args![3_usize, "out"]);
/// ```
#[macro_export]
macro_rules! log_args {
    () => {
        &[] as &[$crate::logging::LogValue]
    };
    ($($arg:expr),+ $(,)?) => {
        &[$($crate::logging::LogValue::from($arg)),+]
    };
}

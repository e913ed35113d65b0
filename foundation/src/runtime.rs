//! The runtime handle and its one-time initialization protocol.
//!
//! A host builds a single [`Runtime`], wraps it in an `Arc`, and calls one of
//! the `initialize*` methods once at startup. Until then [`Runtime::logger`]
//! hands out a null logger, so collaborators may log unconditionally.
//!
//! Initialization is first-caller-wins: later calls, whatever their
//! parameters, only log a notice and return [`InitOutcome::AlreadyInitialized`].

use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;

use anyhow::{Context, Result, bail};

use crate::cancel::{CancellationSource, CancellationToken};
use crate::config::FoundationConfig;
use crate::identity::{self, RuntimeIdentity};
use crate::log_args;
use crate::logging::{
    Logger, LoggerFactory, NullLoggerFactory, TracingLoggerFactory, log_file_path,
};

/// Tool name reported before initialization.
pub const DEFAULT_TOOL_NAME: &str = "foundation";
/// Log name reported before initialization.
pub const DEFAULT_LOG_NAME: &str = "base";

/// What a call to `initialize*` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call performed the initialization.
    Initialized,
    /// Someone else got there first; nothing changed.
    AlreadyInitialized,
}

#[derive(Debug)]
struct InitState {
    tool_name: String,
    log_name: String,
    logger: Logger,
}

/// Process-wide runtime context: identity, logger and cancellation scope.
#[derive(Debug)]
pub struct Runtime {
    init_lock: Mutex<()>,
    state: OnceLock<InitState>,
    null_logger: Logger,
    debug_enabled: AtomicBool,
    session_id: u32,
    cancellation: CancellationSource,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Uninitialized runtime with a fresh session id.
    pub fn new() -> Self {
        Self {
            init_lock: Mutex::new(()),
            state: OnceLock::new(),
            null_logger: Logger::null(),
            debug_enabled: AtomicBool::new(false),
            session_id: identity::new_session_id(),
            cancellation: CancellationSource::new(),
        }
    }

    /// Core initializer.
    ///
    /// The factory runs inside the critical section and only for the caller
    /// that actually initializes. If it fails, the runtime stays
    /// uninitialized and the error is returned.
    pub fn initialize<F>(
        &self,
        tool_name: &str,
        log_name: &str,
        debug: bool,
        factory: &F,
    ) -> Result<InitOutcome>
    where
        F: LoggerFactory + ?Sized,
    {
        if tool_name.trim().is_empty() {
            bail!("tool name must be non-empty");
        }
        if log_name.trim().is_empty() {
            bail!("log name must be non-empty");
        }

        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.logger().info(
            "Initialize called on thread {0}.",
            log_args![format!("{:?}", thread::current().id())],
        );
        if self.state.get().is_some() {
            self.logger().info("Runtime already initialized.", log_args![]);
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let backend = factory
            .create_logger(tool_name)
            .with_context(|| format!("create logger for {tool_name}"))?;
        self.debug_enabled.store(debug, Ordering::SeqCst);
        let state = InitState {
            tool_name: tool_name.to_string(),
            log_name: log_name.to_string(),
            logger: Logger::new(backend),
        };
        if self.state.set(state).is_err() {
            // Unreachable while the lock is held; treat like a lost race.
            return Ok(InitOutcome::AlreadyInitialized);
        }

        self.logger().debug(
            "Runtime initialized for {0}/{1}, session {2}.",
            log_args![tool_name, log_name, self.session_id],
        );
        Ok(InitOutcome::Initialized)
    }

    /// Initialize with a logger that discards everything.
    pub fn initialize_silent(
        &self,
        tool_name: &str,
        log_name: &str,
        debug: bool,
    ) -> Result<InitOutcome> {
        self.initialize(tool_name, log_name, debug, &NullLoggerFactory)
    }

    /// Initialize logging to `{log_dir}/{tool_name}-{log_name}.log`.
    ///
    /// `log_dir` defaults to the executable's directory.
    pub fn initialize_with_file_logging(
        &self,
        tool_name: &str,
        log_name: &str,
        debug: bool,
        log_dir: Option<&Path>,
    ) -> Result<InitOutcome> {
        let path = log_file_path(tool_name, log_name, log_dir);
        self.initialize(
            tool_name,
            log_name,
            debug,
            &TracingLoggerFactory::file(path, debug),
        )
    }

    /// Like [`Runtime::initialize_with_file_logging`], mirrored to stderr.
    pub fn initialize_with_file_and_console_logging(
        &self,
        tool_name: &str,
        log_name: &str,
        debug: bool,
        log_dir: Option<&Path>,
    ) -> Result<InitOutcome> {
        let path = log_file_path(tool_name, log_name, log_dir);
        self.initialize(
            tool_name,
            log_name,
            debug,
            &TracingLoggerFactory::file_and_console(path, debug),
        )
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// The configured logger, or a null logger before initialization.
    pub fn logger(&self) -> &Logger {
        self.state
            .get()
            .map_or(&self.null_logger, |state| &state.logger)
    }

    pub fn tool_name(&self) -> &str {
        self.state
            .get()
            .map_or(DEFAULT_TOOL_NAME, |state| state.tool_name.as_str())
    }

    pub fn log_name(&self) -> &str {
        self.state
            .get()
            .map_or(DEFAULT_LOG_NAME, |state| state.log_name.as_str())
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled.load(Ordering::SeqCst)
    }

    /// Toggle debug mode. The only identity field that may change after init.
    pub fn set_debug_enabled(&self, enabled: bool) {
        self.debug_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Snapshot of the current identity.
    pub fn identity(&self) -> RuntimeIdentity {
        RuntimeIdentity {
            tool_name: self.tool_name().to_string(),
            log_name: self.log_name().to_string(),
            debug_enabled: self.debug_enabled(),
            session_id: self.session_id,
        }
    }

    /// Apply the runtime-relevant parts of a loaded configuration.
    pub fn apply_config(&self, config: &FoundationConfig) {
        if config.debug != self.debug_enabled() {
            self.logger()
                .debug("Debug mode set to {0} by configuration.", log_args![config.debug]);
        }
        self.set_debug_enabled(config.debug);
    }

    /// `{tool_data_dir}/{tool_name}.run`.
    pub fn run_file(&self) -> Option<PathBuf> {
        identity::run_file(self.tool_name())
    }

    /// Observer for the process-wide cancellation scope.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.token()
    }

    /// Cancel the process-wide scope. Irreversible.
    ///
    /// Host-only: the host that built the runtime calls this (the CLI does on
    /// Ctrl-C). Collaborators get a [`CancellationToken`] and only observe.
    pub fn cancel(&self) {
        self.logger().warn("Cancellation requested.", log_args![]);
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Route panics through the logger before the previous hook runs.
    ///
    /// A last-resort record for crashes, not a recovery mechanism.
    pub fn install_panic_hook(self: &Arc<Self>) {
        let runtime = Arc::clone(self);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let payload = info.payload();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            let location = info
                .location()
                .map(ToString::to_string)
                .unwrap_or_default();
            runtime.logger().fatal(
                "Unhandled runtime error occurred: {0} at {1}.",
                log_args![message, location],
            );
            previous(info);
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Level;
    use crate::test_support::MemoryBackend;

    #[test]
    fn logger_is_null_before_initialize() {
        let runtime = Runtime::new();
        assert!(!runtime.is_initialized());
        runtime.logger().error("swallowed {0}", log_args!["quietly"]);
        assert_eq!(runtime.tool_name(), DEFAULT_TOOL_NAME);
        assert_eq!(runtime.log_name(), DEFAULT_LOG_NAME);
    }

    #[test]
    fn first_initialize_wins() {
        let runtime = Runtime::new();
        let first = MemoryBackend::new();
        let second = MemoryBackend::new();

        let outcome = runtime
            .initialize("tool", "build", true, &first.factory())
            .expect("first init");
        assert_eq!(outcome, InitOutcome::Initialized);

        let outcome = runtime
            .initialize("other", "other", false, &second.factory())
            .expect("second init");
        assert_eq!(outcome, InitOutcome::AlreadyInitialized);

        let identity = runtime.identity();
        assert_eq!(identity.tool_name, "tool");
        assert_eq!(identity.log_name, "build");
        assert!(identity.debug_enabled);
        assert!(second.records().is_empty());
        assert!(
            first
                .messages_at(Level::Info)
                .iter()
                .any(|m| m == "Runtime already initialized.")
        );
    }

    #[test]
    fn failing_factory_leaves_runtime_uninitialized() {
        struct Broken;
        impl LoggerFactory for Broken {
            fn create_logger(
                &self,
                _category: &str,
            ) -> Result<Arc<dyn crate::logging::LogBackend>> {
                bail!("no sink")
            }
        }

        let runtime = Runtime::new();
        let err = runtime.initialize("tool", "log", false, &Broken).unwrap_err();
        assert!(format!("{err:#}").contains("no sink"));
        assert!(!runtime.is_initialized());

        let outcome = runtime.initialize_silent("tool", "log", false).expect("retry");
        assert_eq!(outcome, InitOutcome::Initialized);
    }

    #[test]
    fn rejects_empty_names() {
        let runtime = Runtime::new();
        assert!(runtime.initialize_silent(" ", "log", false).is_err());
        assert!(runtime.initialize_silent("tool", "", false).is_err());
        assert!(!runtime.is_initialized());
    }

    #[test]
    fn debug_flag_follows_configuration() {
        let runtime = Runtime::new();
        runtime.initialize_silent("tool", "log", false).expect("init");
        let config = FoundationConfig {
            debug: true,
            ..FoundationConfig::default()
        };
        runtime.apply_config(&config);
        assert!(runtime.debug_enabled());
        assert!(runtime.identity().debug_enabled);
    }

    #[test]
    fn cancel_is_visible_to_tokens() {
        let runtime = Runtime::new();
        let token = runtime.cancellation_token();
        assert!(!token.is_cancelled());
        runtime.cancel();
        assert!(token.is_cancelled());
        assert!(runtime.is_cancelled());
    }

    #[test]
    fn file_logging_creates_named_log_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runtime = Runtime::new();
        runtime
            .initialize_with_file_logging("tool", "unit", false, Some(temp.path()))
            .expect("init");
        runtime.logger().info("hello {0}", log_args!["file"]);

        let contents =
            std::fs::read_to_string(temp.path().join("tool-unit.log")).expect("read log");
        assert!(contents.contains("hello file"));
    }
}

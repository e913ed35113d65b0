//! Scoped operations: a start event now, exactly one end event on drop.

use std::thread;
use std::time::{Duration, Instant};

use super::facade::{Level, LogValue, Logger};

/// A unit of work whose start and end are both logged.
///
/// Call [`Operation::complete`] once the work succeeded. When the guard is
/// dropped it logs `completed` (Info) if that happened and `abandoned`
/// otherwise: Warn on an ordinary exit, Error while unwinding from a panic.
#[must_use = "dropping an operation ends it immediately"]
#[derive(Debug)]
pub struct Operation {
    logger: Logger,
    template: String,
    args: Vec<LogValue>,
    started: Instant,
    completed: bool,
}

impl Logger {
    /// Open a scoped operation and log its start.
    pub fn begin(&self, template: &str, args: &[LogValue]) -> Operation {
        Operation::start(self.clone(), template, args)
    }
}

impl Operation {
    fn start(logger: Logger, template: &str, args: &[LogValue]) -> Self {
        logger.info(&format!("{template} started"), args);
        Self {
            logger,
            template: template.to_string(),
            args: args.to_vec(),
            started: Instant::now(),
            completed: false,
        }
    }

    /// Mark the work as finished successfully.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        // Elapsed time is appended after the caller's args and addressed by index.
        let hole = self.args.len();
        let mut args = std::mem::take(&mut self.args);
        args.push(LogValue::U64(elapsed_ms));

        let (level, outcome) = if self.completed {
            (Level::Info, "completed")
        } else if thread::panicking() {
            (Level::Error, "abandoned")
        } else {
            (Level::Warn, "abandoned")
        };
        let template = format!("{} {outcome} in {{{hole}}} ms", self.template);
        self.logger.log(level, &template, &args);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use anyhow::{Result, bail};

    use super::*;
    use crate::log_args;
    use crate::logging::template::render;
    use crate::test_support::MemoryBackend;

    #[test]
    fn completed_operation_logs_start_then_completion() {
        let backend = MemoryBackend::new();
        let log = Logger::new(backend.clone());

        {
            let mut op = log.begin("Copying {0} to {1}", log_args!["src", "dst"]);
            op.complete();
            assert!(op.is_completed());
        }

        let records = backend.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[0].template, "Copying {0} to {1} started");
        assert_eq!(records[1].level, Level::Info);
        assert_eq!(records[1].template, "Copying {0} to {1} completed in {2} ms");
        assert_eq!(records[1].args.len(), 3);
        assert!(
            render(&records[1].template, &records[1].args)
                .starts_with("Copying src to dst completed in ")
        );
    }

    #[test]
    fn incomplete_operation_logs_abandoned_warning() {
        let backend = MemoryBackend::new();
        let log = Logger::new(backend.clone());

        {
            let _op = log.begin("Downloading {name}", log_args!["solc"]);
        }

        let records = backend.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].level, Level::Warn);
        assert_eq!(records[1].template, "Downloading {name} abandoned in {1} ms");
    }

    #[test]
    fn early_return_still_ends_operation() {
        fn work(log: &Logger, fail: bool) -> Result<()> {
            let mut op = log.begin("Working", log_args![]);
            if fail {
                bail!("nope");
            }
            op.complete();
            Ok(())
        }

        let backend = MemoryBackend::new();
        let log = Logger::new(backend.clone());
        assert!(work(&log, true).is_err());
        work(&log, false).expect("work");

        let levels: Vec<Level> = backend.records().iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![Level::Info, Level::Warn, Level::Info, Level::Info]
        );
    }

    #[test]
    fn panicking_scope_logs_error() {
        let backend = MemoryBackend::new();
        let log = Logger::new(backend.clone());

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _op = log.begin("Exploding", log_args![]);
            panic!("boom");
        }));
        assert!(result.is_err());

        let records = backend.records();
        assert_eq!(records.last().map(|r| r.level), Some(Level::Error));
        assert_eq!(
            records.last().map(|r| r.template.as_str()),
            Some("Exploding abandoned in {0} ms")
        );
    }
}

//! Test-only helpers: in-memory log capture and file fixtures.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::logging::template::render;
use crate::logging::{Level, LogBackend, LogRecord, LogValue, SharedBackendFactory};

/// Owned copy of a record seen by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub template: String,
    pub args: Vec<LogValue>,
    pub error: Option<String>,
}

impl CapturedRecord {
    pub fn rendered(&self) -> String {
        render(&self.template, &self.args)
    }
}

/// Backend that keeps every record in memory for assertions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<CapturedRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Factory that installs this backend on `Runtime::initialize`.
    pub fn factory(self: &Arc<Self>) -> SharedBackendFactory {
        SharedBackendFactory::new(Arc::clone(self) as Arc<dyn LogBackend>)
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records at `level`, rendered.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records()
            .iter()
            .filter(|record| record.level == level)
            .map(CapturedRecord::rendered)
            .collect()
    }
}

impl LogBackend for MemoryBackend {
    fn log(&self, record: &LogRecord<'_>) {
        let captured = CapturedRecord {
            level: record.level,
            template: record.template.to_string(),
            args: record.args.to_vec(),
            error: record.error.map(|err| err.to_string()),
        };
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(captured);
    }
}

/// Create `relative` under `root` (with parents) holding `contents`.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(&path, contents).expect("write fixture file");
}

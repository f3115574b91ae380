//! Persistent run state under the configured state directory
//!
//! The core keeps context and results in memory only; the CLI is the
//! surrounding application, so it owns persistence between invocations.
//!
//! ```text
//! .apichain/
//! ├── context.json    learned identifiers (ambient context)
//! ├── results.json    result log, one live entry per endpoint
//! └── last-run.json   reports from the most recent `apichain run`
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use apichain_core::{BatchReport, ResultLog, RunContext};

const CONTEXT_FILE: &str = "context.json";
const RESULTS_FILE: &str = "results.json";
const LAST_RUN_FILE: &str = "last-run.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("{0} is corrupt: {1}")]
    Corrupt(PathBuf, serde_json::Error),
}

/// File-backed state for one project.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored ambient context; empty when nothing has been saved yet.
    pub fn load_context(&self) -> Result<RunContext, StoreError> {
        self.read_or_default(CONTEXT_FILE)
    }

    pub fn save_context(&self, context: &RunContext) -> Result<PathBuf, StoreError> {
        self.write(CONTEXT_FILE, context)
    }

    /// Forget every learned identifier.
    pub fn reset_context(&self) -> Result<(), StoreError> {
        let path = self.dir.join(CONTEXT_FILE);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    pub fn load_results(&self) -> Result<ResultLog, StoreError> {
        self.read_or_default(RESULTS_FILE)
    }

    pub fn save_results(&self, log: &ResultLog) -> Result<PathBuf, StoreError> {
        self.write(RESULTS_FILE, log)
    }

    pub fn save_last_run(&self, reports: &[BatchReport]) -> Result<PathBuf, StoreError> {
        self.write(LAST_RUN_FILE, reports)
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(self.dir.clone(), e))?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::Corrupt(path.clone(), e))?;
        std::fs::write(&path, json).map_err(|e| StoreError::Io(path.clone(), e))?;
        Ok(path)
    }
}

//! Run Journal
//!
//! Operator-facing artifacts of one console run: a timestamped, append-only detail
//! log of every command and decision, an error log, and the running list of
//! snapshot resource IDs produced by creation runs. Diagnostics for developers go
//! through `tracing`; the journal is what an operator reads after the fact.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default name of the running snapshot-id list inside the log directory.
pub const DEFAULT_SNAPSHOT_LIST: &str = "snap_rid_list.txt";

/// Timestamp identifying one run, `YYYYMMDDHHMMSS` in local time.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Paths of all files a run may produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    log_dir: PathBuf,
    timestamp: String,
    snapshot_list: String,
}

impl RunArtifacts {
    pub fn new(log_dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            timestamp: timestamp.into(),
            snapshot_list: DEFAULT_SNAPSHOT_LIST.to_string(),
        }
    }

    pub fn with_snapshot_list(mut self, file_name: impl Into<String>) -> Self {
        self.snapshot_list = file_name.into();
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn detail_log(&self) -> PathBuf {
        self.log_dir
            .join(format!("snapshot_log_{}.txt", self.timestamp))
    }

    pub fn error_log(&self) -> PathBuf {
        self.log_dir.join(format!("error_log_{}.txt", self.timestamp))
    }

    pub fn creation_summary(&self) -> PathBuf {
        self.log_dir
            .join(format!("snapshot_summary_{}.txt", self.timestamp))
    }

    pub fn validation_results(&self) -> PathBuf {
        self.log_dir
            .join(format!("snapshot_validation_{}.json", self.timestamp))
    }

    pub fn deletion_summary(&self) -> PathBuf {
        self.log_dir
            .join(format!("deletion_summary_{}.json", self.timestamp))
    }

    /// Running list of created snapshot IDs; shared across runs.
    pub fn snapshot_ids(&self) -> PathBuf {
        self.log_dir.join(&self.snapshot_list)
    }
}

/// Append-only writer for a run's artifacts. Safe to share across workers.
#[derive(Debug)]
pub struct RunJournal {
    artifacts: RunArtifacts,
    write_lock: Mutex<()>,
}

impl RunJournal {
    pub fn open(log_dir: &Path, timestamp: &str) -> io::Result<Self> {
        Self::with_artifacts(RunArtifacts::new(log_dir, timestamp))
    }

    pub fn with_artifacts(artifacts: RunArtifacts) -> io::Result<Self> {
        fs::create_dir_all(artifacts.log_dir())?;
        Ok(Self {
            artifacts,
            write_lock: Mutex::new(()),
        })
    }

    pub fn artifacts(&self) -> &RunArtifacts {
        &self.artifacts
    }

    /// Append a timestamped line to the detail log. Failures are reported, not propagated.
    pub fn note(&self, message: &str) {
        let line = format!(
            "{} - {}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
            message
        );
        if let Err(e) = self.append(&self.artifacts.detail_log(), &line) {
            warn!(error = %e, "failed to write detail log");
        }
    }

    /// Append a raw line (no timestamp) to the detail log, e.g. a run header.
    pub fn note_raw(&self, text: &str) {
        if let Err(e) = self.append(&self.artifacts.detail_log(), text) {
            warn!(error = %e, "failed to write detail log");
        }
    }

    /// Append a timestamped line to the error log.
    pub fn error(&self, message: &str) {
        let line = format!(
            "{}: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            message
        );
        if let Err(e) = self.append(&self.artifacts.error_log(), &line) {
            warn!(error = %e, "failed to write error log");
        }
    }

    /// Append a created snapshot's resource ID to the running list.
    pub fn record_snapshot_id(&self, snapshot_id: &str) -> io::Result<()> {
        self.append(&self.artifacts.snapshot_ids(), &format!("{}\n", snapshot_id))
    }

    fn append(&self, path: &Path, text: &str) -> io::Result<()> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())
    }
}

//! Progress reporting for conversion runs.

use std::sync::{Arc, Mutex, MutexGuard};

use gitdocx_shared::ProgressSnapshot;

use crate::pipeline::ConvertResult;

/// Status labels a run moves through.
pub mod labels {
    pub const PARSING_URL: &str = "parsing_url";
    pub const COUNTING_FILES: &str = "counting_files";
    pub const SAVING: &str = "saving";
    pub const COMPLETED: &str = "completed";
    pub const ERROR: &str = "error";

    pub fn scanning(dir: &str) -> String {
        format!("Scanning: {dir}")
    }

    pub fn processing(file: &str) -> String {
        format!("Processing: {file}")
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when the coarse status label changes.
    fn phase(&self, label: &str);
    /// Called once the count pass knows how many files will be processed.
    fn counted(&self, total: usize);
    /// Called before a matching file is downloaded.
    fn file_started(&self, name: &str);
    /// Called after a file section was appended. `total` is 0 when unknown.
    fn file_processed(&self, name: &str, processed: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &ConvertResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _label: &str) {}
    fn counted(&self, _total: usize) {}
    fn file_started(&self, _name: &str) {}
    fn file_processed(&self, _name: &str, _processed: usize, _total: usize) {}
    fn done(&self, _result: &ConvertResult) {}
}

/// Reporter that keeps a pollable [`ProgressSnapshot`].
///
/// Clones share the same snapshot, so one handle can be given to the
/// pipeline while another is read by status requests.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressSnapshot>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().clone()
    }

    /// Mark the run as failed, keeping the counters where they stopped.
    pub fn fail(&self) {
        self.lock().detail_status = labels::ERROR.to_string();
    }

    fn lock(&self) -> MutexGuard<'_, ProgressSnapshot> {
        // A panic while holding the lock leaves a snapshot that is still valid to read.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressReporter for ProgressTracker {
    fn phase(&self, label: &str) {
        self.lock().detail_status = label.to_string();
    }

    fn counted(&self, total: usize) {
        self.lock().total = total;
    }

    fn file_started(&self, name: &str) {
        let mut snapshot = self.lock();
        snapshot.current_file = name.to_string();
        snapshot.detail_status = labels::processing(name);
    }

    fn file_processed(&self, _name: &str, processed: usize, _total: usize) {
        self.lock().processed = processed;
    }

    fn done(&self, _result: &ConvertResult) {
        let mut snapshot = self.lock();
        snapshot.current_file.clear();
        snapshot.detail_status = labels::COMPLETED.to_string();
    }
}

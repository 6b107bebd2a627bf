//! In-memory job registry.
//!
//! Entries are inserted when a job is created and removed only by an
//! explicit cleanup; nothing expires on its own.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use gitdocx_core::{CancelToken, ProgressTracker};
use gitdocx_shared::{GitDocxError, JobId, JobStatus, ProgressSnapshot, Result};

/// The persisted-for-the-process part of a job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub url: String,
    /// Document file names produced by the job.
    pub files: Vec<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Directory holding the job's documents.
    pub output_dir: PathBuf,
}

impl JobRecord {
    pub fn new(id: JobId, url: impl Into<String>, output_dir: PathBuf) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            url: url.into(),
            files: Vec::new(),
            error: None,
            created_at: Utc::now(),
            output_dir,
        }
    }
}

/// A record plus the live handles its worker updates.
#[derive(Debug, Clone)]
pub struct JobEntry {
    pub record: JobRecord,
    pub progress: ProgressTracker,
    pub cancel: CancelToken,
}

/// What a status poll returns.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub status: JobStatus,
    pub url: String,
    pub files: Vec<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSnapshot>,
}

impl From<&JobEntry> for JobView {
    fn from(entry: &JobEntry) -> Self {
        let record = &entry.record;
        let progress = (record.status != JobStatus::Queued).then(|| entry.progress.snapshot());
        Self {
            id: record.id.clone(),
            status: record.status,
            url: record.url.clone(),
            files: record.files.clone(),
            error: record.error.clone(),
            created_at: record.created_at,
            progress,
        }
    }
}

/// Shared handle to every known job, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<JobId, JobEntry>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entry: JobEntry) {
        let id = entry.record.id.clone();
        self.inner.write().await.insert(id, entry);
    }

    pub async fn get(&self, id: &JobId) -> Result<JobEntry> {
        self.inner
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub async fn view(&self, id: &JobId) -> Result<JobView> {
        self.inner
            .read()
            .await
            .get(id)
            .map(JobView::from)
            .ok_or_else(|| not_found(id))
    }

    /// Move a job to `status`. Terminal states are sticky.
    ///
    /// Returns `false` when the job is already terminal.
    pub async fn set_status(&self, id: &JobId, status: JobStatus) -> Result<bool> {
        self.update(id, |record| {
            record.status = status;
        })
        .await
    }

    /// Mark a job completed with the documents it produced.
    pub async fn complete(&self, id: &JobId, files: Vec<String>) -> Result<bool> {
        self.update(id, |record| {
            record.status = JobStatus::Completed;
            record.files = files;
        })
        .await
    }

    /// Mark a job failed with a human-readable message.
    pub async fn fail(&self, id: &JobId, message: impl Into<String>) -> Result<bool> {
        let message = message.into();
        self.update(id, |record| {
            record.status = JobStatus::Error;
            record.error = Some(message);
        })
        .await
    }

    /// Remove a job, returning its last state.
    pub async fn remove(&self, id: &JobId) -> Result<JobEntry> {
        self.inner
            .write()
            .await
            .remove(id)
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    async fn update(&self, id: &JobId, apply: impl FnOnce(&mut JobRecord)) -> Result<bool> {
        let mut jobs = self.inner.write().await;
        let entry = jobs.get_mut(id).ok_or_else(|| not_found(id))?;
        if entry.record.status.is_terminal() {
            debug!(job_id = %id, status = ?entry.record.status, "job already finished, ignoring update");
            return Ok(false);
        }
        apply(&mut entry.record);
        Ok(true)
    }
}

fn not_found(id: &JobId) -> GitDocxError {
    GitDocxError::NotFound(format!("job {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> JobEntry {
        JobEntry {
            record: JobRecord::new(JobId::new(), "https://github.com/acme/widgets", PathBuf::new()),
            progress: ProgressTracker::new(),
            cancel: CancelToken::new(),
        }
    }

    #[tokio::test]
    async fn lifecycle_reaches_completed() {
        let store = JobStore::new();
        let job = entry();
        let id = job.record.id.clone();
        store.insert(job).await;

        assert_eq!(store.view(&id).await.unwrap().status, JobStatus::Queued);
        assert!(store.set_status(&id, JobStatus::Processing).await.unwrap());
        assert!(store.complete(&id, vec!["src.docx".into()]).await.unwrap());

        let view = store.view(&id).await.unwrap();
        assert_eq!(view.status, JobStatus::Completed);
        assert_eq!(view.files, ["src.docx"]);
        assert!(view.progress.is_some());
    }

    #[tokio::test]
    async fn terminal_states_are_sticky() {
        let store = JobStore::new();
        let job = entry();
        let id = job.record.id.clone();
        store.insert(job).await;

        assert!(store.fail(&id, "boom").await.unwrap());
        assert!(!store.set_status(&id, JobStatus::Processing).await.unwrap());
        assert!(!store.complete(&id, vec![]).await.unwrap());

        let view = store.view(&id).await.unwrap();
        assert_eq!(view.status, JobStatus::Error);
        assert_eq!(view.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = JobStore::new();
        let id = JobId::new();
        assert!(matches!(store.view(&id).await, Err(GitDocxError::NotFound(_))));
        assert!(matches!(store.remove(&id).await, Err(GitDocxError::NotFound(_))));
        assert!(matches!(
            store.set_status(&id, JobStatus::Processing).await,
            Err(GitDocxError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_deletes_the_entry() {
        let store = JobStore::new();
        let job = entry();
        let id = job.record.id.clone();
        store.insert(job).await;
        assert_eq!(store.len().await, 1);

        store.remove(&id).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn queued_view_omits_progress() {
        let view = JobView::from(&entry());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "queued");
        assert!(json.get("progress").is_none());
        assert!(json["error"].is_null());
    }
}

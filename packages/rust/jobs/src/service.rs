//! Job orchestration: create, poll, download and clean up conversions.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use url::Url;

use gitdocx_core::{CancelToken, ConvertConfig, DEFAULT_TITLE, ProgressTracker};
use gitdocx_crawler::translate;
use gitdocx_shared::{CrawlConfig, GitDocxError, JobId, Result};

use crate::store::{JobEntry, JobRecord, JobStore, JobView};
use crate::worker::{ConvertTask, JobQueue};

/// Host a conversion address must point at.
const GITHUB_HOST: &str = "github.com";

/// A request to convert a repository folder.
#[derive(Debug, Clone, Default)]
pub struct StartJob {
    pub url: String,
    /// Per-request token; falls back to the server's configured token.
    pub token: Option<String>,
    /// Extensions to select; the server defaults apply when empty.
    pub extensions: Option<Vec<String>>,
}

/// Creates jobs, hands them to the worker pool and answers queries about them.
#[derive(Debug, Clone)]
pub struct JobService {
    store: JobStore,
    queue: JobQueue,
    output_root: PathBuf,
    crawl: CrawlConfig,
    tool_version: String,
}

impl JobService {
    pub fn new(
        store: JobStore,
        queue: JobQueue,
        output_root: impl Into<PathBuf>,
        crawl: CrawlConfig,
        tool_version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue,
            output_root: output_root.into(),
            crawl,
            tool_version: tool_version.into(),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Validate, register and enqueue a job. Returns without waiting for it to run.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn start_job(&self, request: StartJob) -> Result<JobId> {
        let url = request.url.trim().to_string();
        validate_address(&url)?;
        translate(&url, &self.crawl.api_base)?;

        let id = JobId::new();
        let output_dir = self.output_root.join(id.to_string());
        std::fs::create_dir_all(&output_dir).map_err(|e| GitDocxError::io(&output_dir, e))?;

        let mut crawl = self.crawl.clone();
        if let Some(token) = request.token.filter(|t| !t.trim().is_empty()) {
            crawl.token = Some(token.trim().to_string());
        }
        if let Some(extensions) = request.extensions.filter(|e| !e.is_empty()) {
            crawl.extensions = extensions;
        }

        let progress = ProgressTracker::new();
        let cancel = CancelToken::new();
        self.store
            .insert(JobEntry {
                record: JobRecord::new(id.clone(), url.clone(), output_dir.clone()),
                progress: progress.clone(),
                cancel: cancel.clone(),
            })
            .await;

        let task = ConvertTask {
            job_id: id.clone(),
            config: ConvertConfig {
                url,
                output_dir,
                crawl,
                title: DEFAULT_TITLE.to_string(),
                tool_version: self.tool_version.clone(),
            },
            progress,
            cancel,
        };
        if let Err(e) = self.queue.enqueue(task) {
            self.store.fail(&id, e.to_string()).await?;
            return Err(e);
        }

        info!(job_id = %id, "job queued");
        Ok(id)
    }

    pub async fn status(&self, id: &JobId) -> Result<JobView> {
        self.store.view(id).await
    }

    /// Path of a document the job produced.
    ///
    /// Names that are not among the job's files, or that would leave the job
    /// directory, are reported as missing.
    pub async fn artifact_path(&self, id: &JobId, filename: &str) -> Result<PathBuf> {
        let entry = self.store.get(id).await?;
        let missing = || GitDocxError::NotFound(format!("file {filename}"));

        if !is_plain_file_name(filename) || !entry.record.files.iter().any(|f| f == filename) {
            return Err(missing());
        }

        let path = entry.record.output_dir.join(filename);
        if !path.is_file() {
            return Err(missing());
        }
        Ok(path)
    }

    /// Forget a job and delete its output directory.
    #[instrument(skip_all, fields(job_id = %id))]
    pub async fn cleanup(&self, id: &JobId) -> Result<()> {
        let entry = self.store.remove(id).await?;
        entry.cancel.cancel();

        let dir = &entry.record.output_dir;
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %dir.display(), error = %e, "failed to remove job directory"),
        }

        info!("job cleaned up");
        Ok(())
    }
}

/// Reject empty addresses and addresses that do not point at GitHub.
pub fn validate_address(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(GitDocxError::validation("URL is required"));
    }

    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let host = Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase));

    match host {
        Some(host) if host == GITHUB_HOST || host.ends_with(".github.com") => Ok(()),
        _ => Err(GitDocxError::validation("Invalid GitHub URL")),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && path.file_name().is_some_and(|f| f == name)
}

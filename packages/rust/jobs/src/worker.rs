//! Task queue and the fixed pool of workers draining it.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use gitdocx_core::{CancelToken, ConvertConfig, ProgressTracker, convert_tracked};
use gitdocx_shared::{GitDocxError, JobId, JobStatus, Result};

use crate::store::JobStore;

/// One queued conversion.
#[derive(Debug, Clone)]
pub struct ConvertTask {
    pub job_id: JobId,
    pub config: ConvertConfig,
    pub progress: ProgressTracker,
    pub cancel: CancelToken,
}

/// Sending half of the task queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<ConvertTask>,
}

impl JobQueue {
    pub fn enqueue(&self, task: ConvertTask) -> Result<()> {
        self.tx
            .send(task)
            .map_err(|_| GitDocxError::validation("worker pool is not running"))
    }
}

/// A fixed set of tokio tasks taking conversions off a shared queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` workers (at least one) reporting into `store`.
    pub fn start(workers: usize, store: JobStore) -> (Self, JobQueue) {
        let (tx, rx) = mpsc::unbounded_channel::<ConvertTask>();
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let store = store.clone();
                tokio::spawn(async move {
                    loop {
                        // Hold the lock only while waiting for the next task.
                        let task = rx.lock().await.recv().await;
                        match task {
                            Some(task) => run_task(worker, &store, task).await,
                            None => break,
                        }
                    }
                })
            })
            .collect();

        info!(workers = workers.max(1), "worker pool started");
        (Self { handles }, JobQueue { tx })
    }

    /// Wait for every worker to exit. Workers exit once all queue handles are dropped.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task panicked");
            }
        }
    }
}

#[instrument(skip_all, fields(worker = worker, job_id = %task.job_id))]
async fn run_task(worker: usize, store: &JobStore, task: ConvertTask) {
    match store.set_status(&task.job_id, JobStatus::Processing).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(_) => {
            warn!("job was removed before it started");
            return;
        }
    }
    info!(url = %task.config.url, "job started");

    let outcome = convert_tracked(&task.config, &task.progress, &task.cancel).await;

    let recorded = match outcome {
        Ok(result) => {
            let files = result.artifacts.into_iter().map(|a| a.filename).collect();
            info!(processed = result.processed, "job completed");
            store.complete(&task.job_id, files).await
        }
        Err(e) => {
            warn!(error = %e, "job failed");
            task.progress.fail();
            store.fail(&task.job_id, e.to_string()).await
        }
    };

    if recorded.is_err() {
        // Cleanup already ran; drop anything the run wrote after it.
        warn!("job was removed while running");
        remove_output_dir(&task.config.output_dir);
    }
}

fn remove_output_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => info!(path = %dir.display(), "removed output of a cleaned-up job"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), error = %e, "failed to remove job directory"),
    }
}

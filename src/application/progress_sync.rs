//! Progress synchronizer: merges live import progress into the product view
//!
//! One task per watched job. The task subscribes to the job's progress stream
//! and, while the job runs, forces a silent refresh of the current page at
//! most once per refresh interval (2 s, 1 s while processing with visible
//! progress). Every refresh invalidates the prefetch slot before re-fetching.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::orchestrator::{QueryOrchestrator, log_outcome};
use crate::domain::constants::progress::CONNECTION_LOST_MESSAGE;
use crate::domain::import_job::{ImportJob, JobStatus};
use crate::infrastructure::catalog_api::ImportApi;
use crate::infrastructure::config::ProgressConfig;

/// Upload affordance as the console should present it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Running,
    /// Import finished; the upload control is back to its initial state
    Completed,
    Failed { retry_available: bool },
    ConnectionLost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadStatus {
    pub job: ImportJob,
    pub phase: UploadPhase,
    pub message: Option<String>,
}

impl UploadStatus {
    fn starting(job_id: Uuid) -> Self {
        Self {
            job: ImportJob::new(job_id),
            phase: UploadPhase::Running,
            message: None,
        }
    }
}

/// How a watch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed,
    Failed(Option<String>),
    StreamLost(String),
    /// Stopped by the caller
    Stopped,
}

/// Handle to a running watch task
#[derive(Debug)]
pub struct ProgressHandle {
    job_id: Uuid,
    status: watch::Receiver<UploadStatus>,
    cancel: CancellationToken,
    task: JoinHandle<SyncOutcome>,
}

impl ProgressHandle {
    pub const fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn status(&self) -> UploadStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadStatus> {
        self.status.clone()
    }

    /// Stops watching; the task ends with `SyncOutcome::Stopped`
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> SyncOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Progress task for job {} aborted: {}", self.job_id, e);
                SyncOutcome::Stopped
            }
        }
    }
}

#[derive(Clone)]
pub struct ProgressSynchronizer {
    orchestrator: QueryOrchestrator,
    imports: Arc<dyn ImportApi>,
    config: ProgressConfig,
}

impl ProgressSynchronizer {
    pub fn new(orchestrator: QueryOrchestrator, imports: Arc<dyn ImportApi>, config: ProgressConfig) -> Self {
        Self { orchestrator, imports, config }
    }

    /// Refresh floor for the job's current state
    pub const fn refresh_interval(&self, job: &ImportJob) -> Duration {
        if job.is_actively_processing() {
            self.config.active_interval()
        } else {
            self.config.base_interval()
        }
    }

    /// Starts watching `job_id`; the subscription is opened right away
    pub fn watch(&self, job_id: Uuid) -> ProgressHandle {
        let (status_tx, status) = watch::channel(UploadStatus::starting(job_id));
        let cancel = CancellationToken::new();
        let this = self.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { this.run(job_id, status_tx, task_cancel).await });
        ProgressHandle { job_id, status, cancel, task }
    }

    async fn run(&self, job_id: Uuid, status_tx: watch::Sender<UploadStatus>, cancel: CancellationToken) -> SyncOutcome {
        info!("📡 Watching import job {}", job_id);
        let mut job = ImportJob::new(job_id);

        let mut stream = tokio::select! {
            () = cancel.cancelled() => return SyncOutcome::Stopped,
            subscribed = self.imports.subscribe_progress(job_id) => match subscribed {
                Ok(stream) => stream,
                Err(e) => return Self::connection_lost(&status_tx, job, &e.to_string()),
            },
        };

        let mut last_refresh = Instant::now();
        let mut next_refresh = last_refresh + self.refresh_interval(&job);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Stopped watching job {}", job_id);
                    return SyncOutcome::Stopped;
                }
                item = stream.next() => match item {
                    Some(Ok(event)) => {
                        job.apply(&event);
                        debug!("Job {} {:?} {}%", job_id, job.status, job.progress_percent);
                        let status = job.status;
                        match status {
                            JobStatus::Complete => {
                                self.refresh().await;
                                info!("✅ Import job {} complete", job_id);
                                let message = job.message.clone();
                                status_tx.send_replace(UploadStatus { job, phase: UploadPhase::Completed, message });
                                return SyncOutcome::Completed;
                            }
                            JobStatus::Failed => {
                                warn!("❌ Import job {} failed: {:?}", job_id, job.message);
                                let message = job.message.clone();
                                status_tx.send_replace(UploadStatus {
                                    job,
                                    phase: UploadPhase::Failed { retry_available: true },
                                    message: message.clone(),
                                });
                                return SyncOutcome::Failed(message);
                            }
                            JobStatus::Queued | JobStatus::Processing => {
                                // new rows may exist; the slot can no longer be trusted
                                self.orchestrator.controller().invalidate_prefetch().await;
                                status_tx.send_replace(UploadStatus {
                                    job: job.clone(),
                                    phase: UploadPhase::Running,
                                    message: job.message.clone(),
                                });
                                next_refresh = last_refresh + self.refresh_interval(&job);
                            }
                        }
                    }
                    Some(Err(e)) => return Self::connection_lost(&status_tx, job, &e.to_string()),
                    None => return Self::connection_lost(&status_tx, job, "stream ended before a terminal status"),
                },
                () = tokio::time::sleep_until(next_refresh) => {
                    self.refresh().await;
                    last_refresh = Instant::now();
                    next_refresh = last_refresh + self.refresh_interval(&job);
                }
            }
        }
    }

    /// Invalidate-then-refetch, without a loading indicator
    async fn refresh(&self) {
        log_outcome("progress refresh", self.orchestrator.refresh_current().await);
    }

    fn connection_lost(status_tx: &watch::Sender<UploadStatus>, job: ImportJob, reason: &str) -> SyncOutcome {
        warn!("📴 Progress stream for job {} lost: {}", job.id, reason);
        status_tx.send_replace(UploadStatus {
            job,
            phase: UploadPhase::ConnectionLost,
            message: Some(CONNECTION_LOST_MESSAGE.to_string()),
        });
        SyncOutcome::StreamLost(reason.to_string())
    }
}

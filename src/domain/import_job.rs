//! Bulk-import job snapshots as observed through the progress stream

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an import job; owned by the external job runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Also covers the backend's transient "uploading" state before queuing
    #[serde(alias = "uploading")]
    Queued,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// One `data:` frame of `/upload/progress/{job_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress: f64,
}

impl ProgressEvent {
    /// Progress clamped into `0..=100`
    pub fn percent(&self) -> u8 {
        if self.progress.is_nan() {
            return 0;
        }
        // clamped above, the cast cannot truncate
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = self.progress.round().clamp(0.0, 100.0) as u8;
        pct
    }
}

/// Latest known state of an import job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress_percent: u8,
    pub message: Option<String>,
}

impl ImportJob {
    pub const fn new(id: Uuid) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            progress_percent: 0,
            message: None,
        }
    }

    /// Folds a progress frame into the snapshot
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.status = event.status;
        self.progress_percent = event.percent();
        if event.message.is_some() {
            self.message.clone_from(&event.message);
        }
    }

    /// Processing with visible progress tightens the refresh cadence
    pub const fn is_actively_processing(&self) -> bool {
        matches!(self.status, JobStatus::Processing) && self.progress_percent > 0
    }
}

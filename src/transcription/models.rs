//! Data models for transcription jobs.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Status of a transcription job as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    #[serde(rename = "error")]
    Failed,
}

impl JobStatus {
    /// Whether the job can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "error"),
        }
    }
}

/// A submitted transcription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionJob {
    /// Provider-issued identifier.
    pub id: String,
    pub status: JobStatus,
    /// Transcript text, present once completed.
    #[serde(default)]
    pub text: Option<String>,
    /// Failure detail, present once failed.
    #[serde(default)]
    pub error: Option<String>,
}

impl TranscriptionJob {
    /// A freshly submitted job.
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            text: None,
            error: None,
        }
    }

    /// Apply a status report from the provider.
    ///
    /// Transitions only move forward: a report that would move the job back
    /// (or change a terminal job) is ignored. Returns whether the job changed.
    pub fn advance(&mut self, report: TranscriptionJob) -> bool {
        if report.id != self.id {
            warn!("Ignoring status report for job {} while tracking {}", report.id, self.id);
            return false;
        }

        if self.status.is_terminal() || report.status.rank() < self.status.rank() {
            return false;
        }

        let changed = report.status != self.status;
        self.status = report.status;

        match report.status {
            JobStatus::Completed => self.text = report.text,
            JobStatus::Failed => self.error = report.error,
            JobStatus::Queued | JobStatus::Processing => {}
        }

        changed || self.status.is_terminal()
    }
}

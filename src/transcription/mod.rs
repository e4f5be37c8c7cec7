//! Transcription module for ChatAudio.
//!
//! Submits audio to a remote speech-to-text provider and waits for the result.
//!
//! A job moves `SUBMITTED -> POLLING -> {COMPLETED | FAILED}`:
//! [`TranscriptionClient::submit`] creates it, [`JobPoller::await_completion`]
//! drives it to a terminal state and persists the transcript on success.

mod assemblyai;
mod models;
mod poller;

pub use assemblyai::{AssemblyAiClient, QaAnswer};
pub use models::{JobStatus, TranscriptionJob};
pub use poller::{cancel_pair, CancelHandle, CancelSignal, JobPoller, PollPolicy};

use crate::error::Result;
use crate::media::AudioArtifact;
use async_trait::async_trait;

/// Trait for transcription providers.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Upload the artifact and start a transcription job.
    ///
    /// Fails with [`crate::error::ChatAudioError::UploadError`] on network or
    /// authentication failures.
    async fn submit(&self, artifact: &AudioArtifact) -> Result<TranscriptionJob>;

    /// Fetch the current state of a job.
    async fn status(&self, job_id: &str) -> Result<TranscriptionJob>;
}

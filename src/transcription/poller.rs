//! Waiting for a transcription job to finish.

use super::{JobStatus, TranscriptionClient, TranscriptionJob};
use crate::config::TranscriptionSettings;
use crate::error::{ChatAudioError, Result};
use crate::media::MediaReference;
use crate::store::{Transcript, TranscriptStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// How a job is polled until it reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks.
    pub interval: Duration,
    /// Deadline for the whole wait. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Maximum number of status checks.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&TranscriptionSettings::default())
    }
}

impl From<&TranscriptionSettings> for PollPolicy {
    fn from(settings: &TranscriptionSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            timeout: settings.timeout(),
            max_attempts: settings.max_poll_attempts,
        }
    }
}

/// Triggers cancellation of every [`CancelSignal`] cloned from its pair.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Observes cancellation requested through a [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    /// A signal that is never cancelled.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                // Handle dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a connected cancellation handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

/// Drives submitted jobs to completion and persists their transcripts.
pub struct JobPoller {
    client: Arc<dyn TranscriptionClient>,
    store: Arc<dyn TranscriptStore>,
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(
        client: Arc<dyn TranscriptionClient>,
        store: Arc<dyn TranscriptStore>,
        policy: PollPolicy,
    ) -> Self {
        Self { client, store, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll `job` until it completes or fails.
    ///
    /// On completion the transcript overwrites the store. On failure, timeout or
    /// cancellation the store is left untouched. A job that is already completed
    /// is returned as-is without contacting the provider.
    #[instrument(skip(self, job, source, cancel), fields(job_id = %job.id))]
    pub async fn await_completion(
        &self,
        job: &mut TranscriptionJob,
        source: Option<&MediaReference>,
        cancel: &CancelSignal,
    ) -> Result<Transcript> {
        match job.status {
            JobStatus::Completed => return completed_transcript(job, source),
            JobStatus::Failed => return Err(failure(job)),
            JobStatus::Queued | JobStatus::Processing => {}
        }

        let mut cancel = cancel.clone();
        let deadline = self.policy.timeout.map(|timeout| Instant::now() + timeout);
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ChatAudioError::Cancelled);
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(self.timed_out(job));
            }

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(ChatAudioError::PollTimeout(format!(
                        "job {} still {} after {} status checks",
                        job.id, job.status, attempts
                    )));
                }
            }

            attempts += 1;
            let checked = tokio::select! {
                checked = self.client.status(&job.id) => checked,
                _ = cancel.cancelled() => return Err(ChatAudioError::Cancelled),
                _ = until(deadline) => return Err(self.timed_out(job)),
            };
            let report = checked.map_err(|e| {
                ChatAudioError::TranscriptionFailed(format!("status check for job {} failed: {}", job.id, e))
            })?;

            if job.advance(report) {
                debug!("Job {} is now {}", job.id, job.status);
            }

            match job.status {
                JobStatus::Completed => {
                    let transcript = completed_transcript(job, source)?;
                    self.store.write(&transcript)?;
                    info!(
                        "Transcription {} completed ({} words, {} checks)",
                        job.id,
                        transcript.word_count(),
                        attempts
                    );
                    return Ok(transcript);
                }
                JobStatus::Failed => {
                    let err = failure(job);
                    warn!("{}", err);
                    return Err(err);
                }
                JobStatus::Queued | JobStatus::Processing => {
                    debug!("Processing... ({})", job.status);
                }
            }

            let mut wake = Instant::now() + self.policy.interval;
            if let Some(deadline) = deadline {
                wake = wake.min(deadline);
            }

            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {}
                _ = cancel.cancelled() => return Err(ChatAudioError::Cancelled),
            }
        }
    }

    fn timed_out(&self, job: &TranscriptionJob) -> ChatAudioError {
        ChatAudioError::PollTimeout(format!(
            "job {} still {} after {:?}",
            job.id,
            job.status,
            self.policy.timeout.unwrap_or_default()
        ))
    }
}

/// Resolves at `deadline`, or never when there is none.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn completed_transcript(job: &TranscriptionJob, source: Option<&MediaReference>) -> Result<Transcript> {
    let text = job.text.as_deref().unwrap_or_default().trim();
    if text.is_empty() {
        return Err(ChatAudioError::TranscriptionFailed(format!(
            "job {} completed without any transcribed speech",
            job.id
        )));
    }

    let mut transcript = Transcript::new(text).with_job_id(job.id.clone());
    if let Some(source) = source {
        transcript = transcript.with_source(source.clone());
    }
    Ok(transcript)
}

fn failure(job: &TranscriptionJob) -> ChatAudioError {
    ChatAudioError::TranscriptionFailed(
        job.error
            .clone()
            .unwrap_or_else(|| format!("job {} failed without detail", job.id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTranscriptStore;
    use crate::testing::ScriptedTranscriptionClient;

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            timeout: Some(Duration::from_secs(5)),
            max_attempts: None,
        }
    }

    fn poller(client: Arc<ScriptedTranscriptionClient>, store: Arc<MemoryTranscriptStore>, policy: PollPolicy) -> JobPoller {
        JobPoller::new(client, store, policy)
    }

    #[tokio::test]
    async fn test_completes_and_persists() {
        let client = Arc::new(ScriptedTranscriptionClient::completing("J1", "hello world"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let poller = poller(client.clone(), store.clone(), fast_policy());

        let mut job = TranscriptionJob::submitted("J1");
        let source = MediaReference::new("https://video.example/abc");
        let transcript = poller
            .await_completion(&mut job, Some(&source), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(transcript.text, "hello world");
        assert_eq!(transcript.job_id.as_deref(), Some("J1"));
        assert_eq!(transcript.source.as_ref(), Some(&source));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(store.read().unwrap().text, "hello world");
        assert_eq!(client.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_repeated_wait_on_completed_job_does_not_poll() {
        let client = Arc::new(ScriptedTranscriptionClient::completing("J1", "hello world"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let poller = poller(client.clone(), store, fast_policy());

        let mut job = TranscriptionJob::submitted("J1");
        let first = poller.await_completion(&mut job, None, &CancelSignal::never()).await.unwrap();
        let calls = client.status_calls();

        let second = poller.await_completion(&mut job, None, &CancelSignal::never()).await.unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(client.status_calls(), calls);
        assert_eq!(client.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_job_leaves_store_unchanged() {
        let client = Arc::new(ScriptedTranscriptionClient::failing("J2", "Audio file could not be decoded"));
        let store = Arc::new(MemoryTranscriptStore::new());
        store.write(&Transcript::new("previous video")).unwrap();
        let poller = poller(client, store.clone(), fast_policy());

        let mut job = TranscriptionJob::submitted("J2");
        let err = poller
            .await_completion(&mut job, None, &CancelSignal::never())
            .await
            .unwrap_err();

        match err {
            ChatAudioError::TranscriptionFailed(detail) => assert!(detail.contains("could not be decoded")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.read().unwrap().text, "previous video");
    }

    #[tokio::test]
    async fn test_failed_job_on_empty_store_leaves_it_empty() {
        let client = Arc::new(ScriptedTranscriptionClient::failing("J2", "Download error"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let poller = poller(client, store.clone(), fast_policy());

        let mut job = TranscriptionJob::submitted("J2");
        let result = poller.await_completion(&mut job, None, &CancelSignal::never()).await;

        assert!(matches!(result, Err(ChatAudioError::TranscriptionFailed(_))));
        assert!(matches!(store.read(), Err(ChatAudioError::NoTranscriptAvailable)));
    }

    #[tokio::test]
    async fn test_empty_completion_is_a_failure() {
        let client = Arc::new(ScriptedTranscriptionClient::completing("J1", "   "));
        let store = Arc::new(MemoryTranscriptStore::new());
        let poller = poller(client, store.clone(), fast_policy());

        let mut job = TranscriptionJob::submitted("J1");
        let result = poller.await_completion(&mut job, None, &CancelSignal::never()).await;

        assert!(matches!(result, Err(ChatAudioError::TranscriptionFailed(_))));
        assert!(store.read().is_err());
    }

    #[tokio::test]
    async fn test_attempt_limit_bounds_the_wait() {
        let client = Arc::new(ScriptedTranscriptionClient::stuck("J1"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let policy = PollPolicy {
            max_attempts: Some(4),
            ..fast_policy()
        };
        let poller = poller(client.clone(), store, policy);

        let mut job = TranscriptionJob::submitted("J1");
        let result = poller.await_completion(&mut job, None, &CancelSignal::never()).await;

        assert!(matches!(result, Err(ChatAudioError::PollTimeout(_))));
        assert_eq!(client.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_deadline_bounds_the_wait() {
        let client = Arc::new(ScriptedTranscriptionClient::stuck("J1"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let policy = PollPolicy {
            interval: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(30)),
            max_attempts: None,
        };
        let poller = poller(client, store, policy);

        let mut job = TranscriptionJob::submitted("J1");
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            poller.await_completion(&mut job, None, &CancelSignal::never()),
        )
        .await
        .expect("poller should respect its own deadline");

        assert!(matches!(result, Err(ChatAudioError::PollTimeout(_))));
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let client = Arc::new(ScriptedTranscriptionClient::stuck("J1"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let policy = PollPolicy {
            interval: Duration::from_secs(60),
            timeout: None,
            max_attempts: None,
        };
        let poller = poller(client.clone(), store, policy);
        let (handle, signal) = cancel_pair();

        let mut job = TranscriptionJob::submitted("J1");
        let wait = poller.await_completion(&mut job, None, &signal);
        tokio::pin!(wait);

        tokio::select! {
            _ = &mut wait => panic!("stuck job must not finish"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => handle.cancel(),
        }

        let result = tokio::time::timeout(Duration::from_secs(5), wait).await.unwrap();
        assert!(matches!(result, Err(ChatAudioError::Cancelled)));
        assert_eq!(client.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_deadline_interrupts_a_hanging_status_check() {
        let client = Arc::new(ScriptedTranscriptionClient::hanging("J1"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let policy = PollPolicy {
            interval: Duration::from_secs(60),
            timeout: Some(Duration::from_millis(50)),
            max_attempts: None,
        };
        let poller = poller(client.clone(), store, policy);

        let started = std::time::Instant::now();
        let mut job = TranscriptionJob::submitted("J1");
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            poller.await_completion(&mut job, None, &CancelSignal::never()),
        )
        .await
        .expect("deadline must cut the status check short");

        assert!(matches!(result, Err(ChatAudioError::PollTimeout(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(client.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_a_hanging_status_check() {
        let client = Arc::new(ScriptedTranscriptionClient::hanging("J1"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let policy = PollPolicy {
            interval: Duration::from_secs(60),
            timeout: None,
            max_attempts: None,
        };
        let poller = poller(client, store.clone(), policy);
        let (handle, signal) = cancel_pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let started = std::time::Instant::now();
        let mut job = TranscriptionJob::submitted("J1");
        let result = tokio::time::timeout(Duration::from_secs(5), poller.await_completion(&mut job, None, &signal))
            .await
            .expect("cancellation must cut the status check short");

        assert!(matches!(result, Err(ChatAudioError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(store.read().is_err());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let settings = TranscriptionSettings {
            poll_interval_secs: 0,
            ..Default::default()
        };

        assert_eq!(PollPolicy::from(&settings).interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_status_errors_become_transcription_failures() {
        let client = Arc::new(ScriptedTranscriptionClient::unreachable("J1"));
        let store = Arc::new(MemoryTranscriptStore::new());
        let poller = poller(client, store, fast_policy());

        let mut job = TranscriptionJob::submitted("J1");
        let result = poller.await_completion(&mut job, None, &CancelSignal::never()).await;

        assert!(matches!(result, Err(ChatAudioError::TranscriptionFailed(_))));
    }
}

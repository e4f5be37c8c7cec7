//! Interaction controller for ChatAudio.
//!
//! Coordinates one user session: a media link goes through fetch, submit and
//! wait; questions are then answered against the resulting transcript.

use crate::answer::{build_engine, Answer, AnswerEngine};
use crate::config::{Credentials, Settings};
use crate::error::{ChatAudioError, Result};
use crate::media::{AudioArtifact, MediaFetcher, MediaReference, YtDlpFetcher};
use crate::retry::RetryPolicy;
use crate::store::{FileTranscriptStore, Transcript, TranscriptStore};
use crate::transcription::{AssemblyAiClient, CancelSignal, JobPoller, PollPolicy, TranscriptionClient};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Where the session stands with respect to the current media link.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Nothing submitted yet.
    Idle,
    /// The transcript of the current media is available.
    Ready(Transcript),
    /// The last submission failed; there is no current transcript.
    Failed { media: MediaReference, reason: String },
}

/// A single-user ChatAudio session.
pub struct Session {
    fetcher: Arc<dyn MediaFetcher>,
    transcriber: Arc<dyn TranscriptionClient>,
    store: Arc<dyn TranscriptStore>,
    engine: Arc<dyn AnswerEngine>,
    poller: JobPoller,
    cancel: CancelSignal,
    artifact: Option<AudioArtifact>,
    state: SessionState,
}

impl Session {
    /// Build a session backed by yt-dlp, AssemblyAI and the configured answer strategy.
    ///
    /// The transcript is stored under `general.output_dir`.
    pub fn from_settings(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let store = Arc::new(FileTranscriptStore::new(settings.output_dir()));
        Self::from_settings_with_store(settings, credentials, store)
    }

    /// Like [`Session::from_settings`] with an explicit transcript store.
    pub fn from_settings_with_store(
        settings: &Settings,
        credentials: &Credentials,
        store: Arc<dyn TranscriptStore>,
    ) -> Result<Self> {
        let client = Arc::new(AssemblyAiClient::new(
            &settings.transcription.base_url,
            &credentials.transcription_api_key,
            settings.transcription.request_timeout(),
            RetryPolicy::from(&settings.retry),
        )?);

        let engine = build_engine(settings, credentials, client.clone())?;
        let fetcher = Arc::new(YtDlpFetcher::new(settings.temp_dir()));

        Ok(Self::with_components(
            fetcher,
            client,
            store,
            engine,
            PollPolicy::from(&settings.transcription),
        ))
    }

    /// Create a session with custom components.
    pub fn with_components(
        fetcher: Arc<dyn MediaFetcher>,
        transcriber: Arc<dyn TranscriptionClient>,
        store: Arc<dyn TranscriptStore>,
        engine: Arc<dyn AnswerEngine>,
        policy: PollPolicy,
    ) -> Self {
        let poller = JobPoller::new(transcriber.clone(), store.clone(), policy);

        Self {
            fetcher,
            transcriber,
            store,
            engine,
            poller,
            cancel: CancelSignal::never(),
            artifact: None,
            state: SessionState::Idle,
        }
    }

    /// Abort in-flight submissions (fetch, upload or wait) when `cancel` fires.
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The transcript of the current media, if any.
    pub fn transcript(&self) -> Option<&Transcript> {
        match &self.state {
            SessionState::Ready(transcript) => Some(transcript),
            _ => None,
        }
    }

    /// The media link of the current or last failed submission.
    pub fn media(&self) -> Option<&MediaReference> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Ready(transcript) => transcript.source.as_ref(),
            SessionState::Failed { media, .. } => Some(media),
        }
    }

    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<dyn AnswerEngine> {
        &self.engine
    }

    /// Make `transcript` the current one without transcribing anything.
    pub fn adopt(&mut self, transcript: Transcript) {
        self.state = SessionState::Ready(transcript);
    }

    /// Fetch, transcribe and store the audio behind `url`.
    ///
    /// On failure the session has no current transcript until the next
    /// successful submission; the store keeps whatever it held before.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn submit_media(&mut self, url: &str) -> Result<Transcript> {
        let media = MediaReference::new(url);

        if let Some(previous) = self.artifact.take() {
            previous.discard();
        }
        self.state = SessionState::Idle;

        match self.transcribe(&media).await {
            Ok(transcript) => {
                info!("Transcript ready ({} words)", transcript.word_count());
                self.state = SessionState::Ready(transcript.clone());
                Ok(transcript)
            }
            Err(e) => {
                warn!("Submission of {} failed: {}", media, e);
                self.state = SessionState::Failed {
                    media,
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn transcribe(&mut self, media: &MediaReference) -> Result<Transcript> {
        if media.as_str().is_empty() {
            return Err(ChatAudioError::MediaUnavailable("no link given".to_string()));
        }

        let mut cancel = self.cancel.clone();
        let artifact = tokio::select! {
            fetched = self.fetcher.fetch(media) => fetched?,
            _ = cancel.cancelled() => return Err(ChatAudioError::Cancelled),
        };

        let submitted = tokio::select! {
            submitted = self.transcriber.submit(&artifact) => submitted,
            _ = cancel.cancelled() => Err(ChatAudioError::Cancelled),
        };
        let mut job = match submitted {
            Ok(job) => job,
            Err(e) => {
                artifact.discard();
                return Err(e);
            }
        };
        self.artifact = Some(artifact);

        let result = self.poller.await_completion(&mut job, Some(media), &self.cancel).await;

        if let Some(artifact) = self.artifact.take() {
            artifact.discard();
        }
        result
    }

    /// Answer `question` about the current transcript.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatAudioError::InvalidInput("the question is empty".to_string()));
        }

        let transcript = self.transcript().ok_or(ChatAudioError::NoTranscriptAvailable)?;
        self.engine.answer(transcript, question).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            artifact.discard();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnswerStrategy;
    use crate::store::MemoryTranscriptStore;
    use crate::testing::{EchoAnswerEngine, FakeFetcher, ScriptedTranscriptionClient};
    use std::time::Duration;

    struct Harness {
        fetcher: Arc<FakeFetcher>,
        client: Arc<ScriptedTranscriptionClient>,
        store: Arc<MemoryTranscriptStore>,
        engine: Arc<EchoAnswerEngine>,
        session: Session,
        _dir: tempfile::TempDir,
    }

    fn harness(client: ScriptedTranscriptionClient) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::new(dir.path()));
        let client = Arc::new(client);
        let store = Arc::new(MemoryTranscriptStore::new());
        let engine = Arc::new(EchoAnswerEngine::default());
        let policy = PollPolicy {
            interval: Duration::from_millis(1),
            timeout: Some(Duration::from_secs(5)),
            max_attempts: None,
        };

        let session = Session::with_components(
            fetcher.clone(),
            client.clone(),
            store.clone(),
            engine.clone(),
            policy,
        );

        Harness {
            fetcher,
            client,
            store,
            engine,
            session,
            _dir: dir,
        }
    }

    const URL: &str = "https://video.example/abc";

    #[tokio::test]
    async fn test_happy_path() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));

        let transcript = h.session.submit_media(URL).await.unwrap();
        assert_eq!(transcript.text, "hello world");
        assert_eq!(h.store.read().unwrap().text, "hello world");
        assert_eq!(h.session.media().map(|m| m.as_str()), Some(URL));

        let answer = h.session.ask("What is discussed?").await.unwrap();
        assert_eq!(answer.text, "hello world | What is discussed?");
        assert_eq!(h.engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_ask_before_transcript() {
        let h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));

        let err = h.session.ask("anything").await.unwrap_err();
        assert!(matches!(err, ChatAudioError::NoTranscriptAvailable));
        assert!(err.is_usage_error());
        assert_eq!(h.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));
        h.session.submit_media(URL).await.unwrap();

        let err = h.session.ask("   ").await.unwrap_err();
        assert!(matches!(err, ChatAudioError::InvalidInput(_)));
        assert_eq!(h.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_media_never_reaches_transcription() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));
        h.fetcher.fail_with("no audio stream");

        let err = h.session.submit_media(URL).await.unwrap_err();
        assert!(matches!(err, ChatAudioError::MediaUnavailable(_)));
        assert_eq!(h.client.submit_calls(), 0);
        assert!(matches!(h.session.state(), SessionState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_failed_transcription_keeps_store_but_blocks_questions() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "first video"));
        h.session.submit_media(URL).await.unwrap();

        h.client.script_next("J2", Err("Audio file could not be decoded".to_string()));
        let err = h.session.submit_media("https://video.example/other").await.unwrap_err();

        assert!(matches!(err, ChatAudioError::TranscriptionFailed(_)));
        assert_eq!(h.store.read().unwrap().text, "first video");
        assert!(h.session.transcript().is_none());
        assert!(matches!(
            h.session.ask("What was the first video about?").await,
            Err(ChatAudioError::NoTranscriptAvailable)
        ));
    }

    #[tokio::test]
    async fn test_new_submission_replaces_transcript() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "first video"));
        h.session.submit_media(URL).await.unwrap();

        h.client.script_next("J2", Ok("second video".to_string()));
        h.session.submit_media("https://video.example/other").await.unwrap();

        assert_eq!(h.store.read().unwrap().text, "second video");
        let answer = h.session.ask("which?").await.unwrap();
        assert_eq!(answer.text, "second video | which?");
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));
        h.client.reject_uploads("Invalid API key");

        let err = h.session.submit_media(URL).await.unwrap_err();
        assert!(matches!(err, ChatAudioError::UploadError(_)));
        assert!(h.session.transcript().is_none());
        assert!(!h.fetcher.fetched_paths()[0].exists());
    }

    #[tokio::test]
    async fn test_audio_artifacts_are_discarded() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));
        h.session.submit_media(URL).await.unwrap();

        let fetched = h.fetcher.fetched_paths();
        assert_eq!(fetched.len(), 1);
        assert!(!fetched[0].exists());
    }

    #[tokio::test]
    async fn test_adopted_transcript_is_answerable() {
        let mut h = harness(ScriptedTranscriptionClient::completing("J1", "unused"));
        h.session.adopt(Transcript::new("from an earlier run"));

        let answer = h.session.ask("what?").await.unwrap();
        assert_eq!(answer.text, "from an earlier run | what?");
        assert_eq!(answer.strategy, AnswerStrategy::Indexed);
        assert_eq!(h.client.submit_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_wait_leaves_session_without_transcript() {
        let mut h = harness(ScriptedTranscriptionClient::stuck("J1"));
        let (handle, signal) = crate::transcription::cancel_pair();
        handle.cancel();
        let mut session = std::mem::replace(
            &mut h.session,
            Session::with_components(
                h.fetcher.clone(),
                h.client.clone(),
                h.store.clone(),
                h.engine.clone(),
                PollPolicy::default(),
            ),
        )
        .with_cancel_signal(signal);

        let err = session.submit_media(URL).await.unwrap_err();
        assert!(matches!(err, ChatAudioError::Cancelled));
        assert!(session.transcript().is_none());
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_a_stalled_fetch() {
        let h = harness(ScriptedTranscriptionClient::completing("J1", "hello world"));
        h.fetcher.stall();
        let (handle, signal) = crate::transcription::cancel_pair();
        let mut session = Session::with_components(
            h.fetcher.clone(),
            h.client.clone(),
            h.store.clone(),
            h.engine.clone(),
            PollPolicy::default(),
        )
        .with_cancel_signal(signal);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), session.submit_media(URL))
            .await
            .expect("cancellation must interrupt the fetch")
            .unwrap_err();

        assert!(matches!(err, ChatAudioError::Cancelled));
        assert_eq!(h.client.submit_calls(), 0);
        assert!(matches!(session.state(), SessionState::Failed { .. }));
    }
}

//! In-process fakes for the pipeline ports.

use crate::answer::{Answer, AnswerEngine, LanguageModel, QuestionAnswering};
use crate::config::AnswerStrategy;
use crate::embedding::Embedder;
use crate::error::{ChatAudioError, Result};
use crate::media::{AudioArtifact, MediaFetcher, MediaReference};
use crate::store::Transcript;
use crate::transcription::{JobStatus, TranscriptionClient, TranscriptionJob};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Writes a small placeholder audio file per fetch.
pub struct FakeFetcher {
    dir: PathBuf,
    failure: Mutex<Option<String>>,
    stalled: AtomicBool,
    fetched: Mutex<Vec<PathBuf>>,
}

impl FakeFetcher {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            failure: Mutex::new(None),
            stalled: AtomicBool::new(false),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Make every following fetch fail with `MediaUnavailable(reason)`.
    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    /// Make every following fetch wait forever.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn fetched_paths(&self) -> Vec<PathBuf> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, reference: &MediaReference) -> Result<AudioArtifact> {
        if self.stalled.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(ChatAudioError::MediaUnavailable(reason));
        }
        reference.parse_url()?;

        let mut fetched = self.fetched.lock().unwrap();
        let path = self.dir.join(format!("audio-{}.mp3", fetched.len()));
        std::fs::write(&path, b"ID3")?;
        fetched.push(path.clone());

        Ok(AudioArtifact::new(path, reference.clone()))
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Status(JobStatus, Option<String>),
    Unreachable,
    Hang,
}

/// Hands out scripted job ids on submit and scripted reports on status.
///
/// Each job replays its reports in order; the last one repeats.
#[derive(Default)]
pub struct ScriptedTranscriptionClient {
    submissions: Mutex<VecDeque<String>>,
    jobs: Mutex<HashMap<String, VecDeque<Reply>>>,
    upload_error: Mutex<Option<String>>,
    submits: AtomicU32,
    statuses: AtomicU32,
}

impl ScriptedTranscriptionClient {
    /// `id` goes queued, processing, then completes with `text`.
    pub fn completing(id: &str, text: &str) -> Self {
        let client = Self::default();
        client.script(
            id,
            vec![
                Reply::Status(JobStatus::Queued, None),
                Reply::Status(JobStatus::Processing, None),
                Reply::Status(JobStatus::Completed, Some(text.to_string())),
            ],
        );
        client
    }

    /// `id` goes processing, then fails with `error`.
    pub fn failing(id: &str, error: &str) -> Self {
        let client = Self::default();
        client.script(
            id,
            vec![
                Reply::Status(JobStatus::Processing, None),
                Reply::Status(JobStatus::Failed, Some(error.to_string())),
            ],
        );
        client
    }

    /// `id` stays processing forever.
    pub fn stuck(id: &str) -> Self {
        let client = Self::default();
        client.script(id, vec![Reply::Status(JobStatus::Processing, None)]);
        client
    }

    /// Every status check for `id` fails.
    pub fn unreachable(id: &str) -> Self {
        let client = Self::default();
        client.script(id, vec![Reply::Unreachable]);
        client
    }

    /// Every status check for `id` waits forever.
    pub fn hanging(id: &str) -> Self {
        let client = Self::default();
        client.script(id, vec![Reply::Hang]);
        client
    }

    /// Queue another submission resolving to `Ok(text)` or `Err(error)`.
    pub fn script_next(&self, id: &str, outcome: std::result::Result<String, String>) {
        let last = match outcome {
            Ok(text) => Reply::Status(JobStatus::Completed, Some(text)),
            Err(error) => Reply::Status(JobStatus::Failed, Some(error)),
        };
        self.script(id, vec![Reply::Status(JobStatus::Processing, None), last]);
    }

    /// Make every following submit fail with `UploadError(reason)`.
    pub fn reject_uploads(&self, reason: &str) {
        *self.upload_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn submit_calls(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.statuses.load(Ordering::SeqCst)
    }

    fn script(&self, id: &str, replies: Vec<Reply>) {
        self.submissions.lock().unwrap().push_back(id.to_string());
        self.jobs.lock().unwrap().insert(id.to_string(), replies.into());
    }
}

#[async_trait]
impl TranscriptionClient for ScriptedTranscriptionClient {
    async fn submit(&self, _artifact: &AudioArtifact) -> Result<TranscriptionJob> {
        self.submits.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.upload_error.lock().unwrap().clone() {
            return Err(ChatAudioError::UploadError(reason));
        }

        let id = self
            .submissions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatAudioError::UploadError("no scripted job left".to_string()))?;
        Ok(TranscriptionJob::submitted(id))
    }

    async fn status(&self, job_id: &str) -> Result<TranscriptionJob> {
        self.statuses.fetch_add(1, Ordering::SeqCst);

        let reply = {
            let mut jobs = self.jobs.lock().unwrap();
            let replies = jobs.get_mut(job_id).ok_or_else(|| ChatAudioError::Provider {
                status: 404,
                body: format!("unknown job {}", job_id),
            })?;

            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(Reply::Status(status, detail)) => {
                let mut job = TranscriptionJob::submitted(job_id);
                job.status = status;
                match status {
                    JobStatus::Completed => job.text = detail,
                    JobStatus::Failed => job.error = detail,
                    JobStatus::Queued | JobStatus::Processing => {}
                }
                Ok(job)
            }
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Unreachable) | None => Err(ChatAudioError::Provider {
                status: 503,
                body: "service unavailable".to_string(),
            }),
        }
    }
}

/// Replies with the transcript text and the question, joined by ` | `.
#[derive(Default)]
pub struct EchoAnswerEngine {
    calls: AtomicU32,
}

impl EchoAnswerEngine {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerEngine for EchoAnswerEngine {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::Indexed
    }

    async fn answer(&self, transcript: &Transcript, question: &str) -> Result<Answer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Answer {
            text: format!("{} | {}", transcript.text, question),
            passages: Vec::new(),
            strategy: AnswerStrategy::Indexed,
        })
    }
}

/// One dimension per keyword: 1.0 when the text mentions it, else 0.0.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    batches: AtomicU32,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            batches: AtomicU32::new(0),
        }
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| if text.contains(k.as_str()) { 1.0 } else { 0.0 })
            .collect()
    }

    pub fn batch_calls(&self) -> u32 {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len()
    }
}

/// Records prompts and returns a fixed reply, or fails.
pub struct FakeLanguageModel {
    reply: Option<String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeLanguageModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The last `(system, user)` prompt pair.
    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for FakeLanguageModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        self.reply.clone().ok_or_else(|| ChatAudioError::Provider {
            status: 500,
            body: "model overloaded".to_string(),
        })
    }
}

/// Records `(job_id, question, answer_format)` and returns a fixed answer.
pub struct StaticQuestionAnswering {
    answer: std::result::Result<String, u16>,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl StaticQuestionAnswering {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            answer: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionAnswering for StaticQuestionAnswering {
    async fn ask(&self, job_id: &str, question: &str, answer_format: &str) -> Result<String> {
        self.requests.lock().unwrap().push((
            job_id.to_string(),
            question.to_string(),
            answer_format.to_string(),
        ));

        self.answer.clone().map_err(|status| ChatAudioError::Provider {
            status,
            body: "unavailable".to_string(),
        })
    }
}

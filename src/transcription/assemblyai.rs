//! AssemblyAI HTTP client.
//!
//! Implements both the transcription provider contract and the hosted
//! question-answering capability used by the direct answer strategy.

use super::{TranscriptionClient, TranscriptionJob};
use crate::answer::QuestionAnswering;
use crate::error::{ChatAudioError, Result};
use crate::media::AudioArtifact;
use crate::retry::{retry_transient, RetryPolicy};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// AssemblyAI REST client.
pub struct AssemblyAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
}

#[derive(Serialize)]
struct QuestionAnswerRequest<'a> {
    transcript_ids: Vec<&'a str>,
    questions: Vec<QuestionSpec<'a>>,
}

#[derive(Serialize)]
struct QuestionSpec<'a> {
    question: &'a str,
    answer_format: &'a str,
}

#[derive(Deserialize)]
struct QuestionAnswerResponse {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    response: Vec<QaAnswer>,
}

/// One answered question from the question-answering endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl AssemblyAiClient {
    /// Create a client for `base_url` (e.g. `https://api.assemblyai.com`).
    pub fn new(
        base_url: &str,
        api_key: &str,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload raw audio bytes, returning the provider-side URL.
    ///
    /// Retries share the same buffer.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(&self, bytes: Bytes) -> Result<String> {
        let url = &self.endpoint("/v2/upload");
        let bytes = &bytes;

        let response: UploadResponse = retry_transient(&self.retry, "audio upload", move || async move {
            let response = self
                .http
                .post(url)
                .header(AUTHORIZATION, &self.api_key)
                .header("content-type", "application/octet-stream")
                .body(bytes.clone())
                .send()
                .await?;
            Ok::<_, ChatAudioError>(check_status(response).await?.json().await?)
        })
        .await?;

        debug!("Uploaded audio to {}", response.upload_url);
        Ok(response.upload_url)
    }

    /// Start a transcription job for audio reachable at `audio_url`.
    #[instrument(skip(self))]
    pub async fn create_transcript(&self, audio_url: &str) -> Result<TranscriptionJob> {
        let url = &self.endpoint("/v2/transcript");

        retry_transient(&self.retry, "transcript creation", move || async move {
            let response = self
                .http
                .post(url)
                .header(AUTHORIZATION, &self.api_key)
                .json(&TranscriptRequest { audio_url })
                .send()
                .await?;
            Ok::<_, ChatAudioError>(check_status(response).await?.json::<TranscriptionJob>().await?)
        })
        .await
    }

    /// Ask questions about completed transcripts.
    #[instrument(skip(self, questions), fields(count = questions.len()))]
    pub async fn question_answer(
        &self,
        transcript_ids: &[&str],
        questions: &[&str],
        answer_format: &str,
    ) -> Result<Vec<QaAnswer>> {
        let url = self.endpoint("/lemur/v3/generate/question-answer");
        let request = QuestionAnswerRequest {
            transcript_ids: transcript_ids.to_vec(),
            questions: questions
                .iter()
                .map(|&question| QuestionSpec { question, answer_format })
                .collect(),
        };

        let (url, request) = (&url, &request);

        let response: QuestionAnswerResponse =
            retry_transient(&self.retry, "question answering", move || async move {
                let response = self
                    .http
                    .post(url)
                    .header(AUTHORIZATION, &self.api_key)
                    .json(request)
                    .send()
                    .await?;
                Ok::<_, ChatAudioError>(check_status(response).await?.json().await?)
            })
            .await?;

        if let Some(id) = &response.request_id {
            debug!("Question answering request {}", id);
        }
        Ok(response.response)
    }
}

/// Turn a non-success response into [`ChatAudioError::Provider`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(ChatAudioError::Provider {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TranscriptionClient for AssemblyAiClient {
    #[instrument(skip(self), fields(artifact = %artifact.path().display()))]
    async fn submit(&self, artifact: &AudioArtifact) -> Result<TranscriptionJob> {
        let bytes = tokio::fs::read(artifact.path()).await.map_err(|e| {
            ChatAudioError::UploadError(format!("cannot read {}: {}", artifact.file_name(), e))
        })?;

        let upload_url = self
            .upload(Bytes::from(bytes))
            .await
            .map_err(|e| ChatAudioError::UploadError(e.to_string()))?;

        let job = self
            .create_transcript(&upload_url)
            .await
            .map_err(|e| ChatAudioError::UploadError(e.to_string()))?;

        info!("Submitted transcription job {}", job.id);
        Ok(job)
    }

    async fn status(&self, job_id: &str) -> Result<TranscriptionJob> {
        let url = &self.endpoint(&format!("/v2/transcript/{}", job_id));

        retry_transient(&self.retry, "status check", move || async move {
            let response = self
                .http
                .get(url)
                .header(AUTHORIZATION, &self.api_key)
                .send()
                .await?;
            Ok::<_, ChatAudioError>(check_status(response).await?.json::<TranscriptionJob>().await?)
        })
        .await
    }
}

#[async_trait]
impl QuestionAnswering for AssemblyAiClient {
    async fn ask(&self, job_id: &str, question: &str, answer_format: &str) -> Result<String> {
        let answers = self
            .question_answer(&[job_id], &[question], answer_format)
            .await?;

        answers
            .into_iter()
            .next()
            .map(|a| a.answer)
            .ok_or_else(|| ChatAudioError::AnswerUnavailable("empty response from question-answering endpoint".into()))
    }
}

//! Answers from the provider's hosted question-answering endpoint.

use super::{unavailable, Answer, AnswerEngine, QuestionAnswering};
use crate::config::AnswerStrategy;
use crate::error::{ChatAudioError, Result};
use crate::store::Transcript;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

/// Forwards each question, together with the provider job id, to a
/// [`QuestionAnswering`] backend.
pub struct DirectAnswerEngine {
    qa: Arc<dyn QuestionAnswering>,
    answer_format: String,
}

impl DirectAnswerEngine {
    pub fn new(qa: Arc<dyn QuestionAnswering>, answer_format: &str) -> Self {
        Self {
            qa,
            answer_format: answer_format.to_string(),
        }
    }
}

#[async_trait]
impl AnswerEngine for DirectAnswerEngine {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::Direct
    }

    #[instrument(skip(self, transcript), fields(question = %question))]
    async fn answer(&self, transcript: &Transcript, question: &str) -> Result<Answer> {
        let job_id = transcript.job_id.as_deref().ok_or_else(|| {
            ChatAudioError::AnswerUnavailable(
                "the transcript has no provider job id; direct answers need a transcript created by the provider"
                    .to_string(),
            )
        })?;

        let text = self
            .qa
            .ask(job_id, question, &self.answer_format)
            .await
            .map_err(unavailable)?;

        Ok(Answer {
            text,
            passages: Vec::new(),
            strategy: AnswerStrategy::Direct,
        })
    }
}

//! Answer Engine: questions about the current transcript.
//!
//! Two strategies share one contract:
//! - [`IndexedAnswerEngine`] splits and embeds the transcript, retrieves the
//!   closest excerpts and composes an answer with a language model.
//! - [`DirectAnswerEngine`] forwards the question to the transcription
//!   provider's transcript-aware question-answering endpoint.

mod direct;
mod index;
mod indexed;
mod llm;
mod splitter;

pub use direct::DirectAnswerEngine;
pub use index::{build_index, cosine_similarity, format_passages_for_prompt, Passage, TranscriptIndex};
pub use indexed::{IndexedAnswerEngine, NO_CONTEXT_ANSWER};
pub use llm::{LanguageModel, OpenAIChatModel};
pub use splitter::TextSplitter;

use crate::config::{AnswerStrategy, Credentials, Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::{ChatAudioError, Result};
use crate::openai::{create_client, DEFAULT_TIMEOUT_SECS};
use crate::store::Transcript;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The response to one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    /// Transcript excerpts the answer was composed from. Empty for the direct strategy.
    pub passages: Vec<Passage>,
    pub strategy: AnswerStrategy,
}

/// Answers questions about a transcript.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    fn strategy(&self) -> AnswerStrategy;

    /// Fails with [`ChatAudioError::AnswerUnavailable`] when the backing provider fails.
    async fn answer(&self, transcript: &Transcript, question: &str) -> Result<Answer>;
}

/// Hosted question answering over a transcript the provider already holds.
#[async_trait]
pub trait QuestionAnswering: Send + Sync {
    async fn ask(&self, job_id: &str, question: &str, answer_format: &str) -> Result<String>;
}

/// Build the engine selected by `settings.answer.strategy`.
pub fn build_engine(
    settings: &Settings,
    credentials: &Credentials,
    qa: Arc<dyn QuestionAnswering>,
) -> Result<Arc<dyn AnswerEngine>> {
    let answer = &settings.answer;

    match answer.strategy {
        AnswerStrategy::Direct => Ok(Arc::new(DirectAnswerEngine::new(qa, &answer.answer_format))),
        AnswerStrategy::Indexed => {
            let client = create_client(&credentials.llm_api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
            let embedder = OpenAIEmbedder::new(client.clone(), &answer.embedding_model, answer.dimensions as usize);
            let llm = OpenAIChatModel::new(client, &answer.model, answer.temperature);
            let prompts = Prompts::load(
                settings.prompts.custom_dir.as_deref(),
                Some(&settings.prompts.variables),
            )?;

            let engine = IndexedAnswerEngine::new(
                Arc::new(embedder),
                Arc::new(llm),
                TextSplitter::new(answer.chunk_size, answer.chunk_overlap),
            )
            .with_prompts(prompts)
            .with_top_k(answer.top_k)
            .with_min_score(answer.min_score);

            Ok(Arc::new(engine))
        }
    }
}

/// Report any provider failure as [`ChatAudioError::AnswerUnavailable`].
pub(crate) fn unavailable(err: ChatAudioError) -> ChatAudioError {
    match err {
        ChatAudioError::AnswerUnavailable(_) => err,
        other => ChatAudioError::AnswerUnavailable(other.to_string()),
    }
}

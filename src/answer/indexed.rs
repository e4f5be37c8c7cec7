//! Retrieval-augmented answers over an embedded transcript.

use super::index::{build_index, format_passages_for_prompt, TranscriptIndex};
use super::{unavailable, Answer, AnswerEngine, LanguageModel, TextSplitter};
use crate::config::{AnswerStrategy, Prompts};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::Transcript;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Reply used when no excerpt is close enough to the question.
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find anything in the transcript about that.";

/// Answers from the transcript excerpts most similar to the question.
///
/// The index is kept between questions and rebuilt only when the transcript
/// text changes.
pub struct IndexedAnswerEngine {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    splitter: TextSplitter,
    prompts: Prompts,
    top_k: usize,
    min_score: f32,
    cached: Mutex<Option<Arc<TranscriptIndex>>>,
}

impl IndexedAnswerEngine {
    pub fn new(embedder: Arc<dyn Embedder>, llm: Arc<dyn LanguageModel>, splitter: TextSplitter) -> Self {
        Self {
            embedder,
            llm,
            splitter,
            prompts: Prompts::default(),
            top_k: 4,
            min_score: 0.0,
            cached: Mutex::new(None),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the number of excerpts passed to the model.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// The index for `transcript`, built on first use or when the text changed.
    pub async fn index_for(&self, transcript: &Transcript) -> Result<Arc<TranscriptIndex>> {
        let hash = transcript.content_hash();
        let mut cached = self.cached.lock().await;

        if let Some(index) = cached.as_ref().filter(|index| index.content_hash() == hash) {
            debug!("Reusing transcript index {}", &hash[..12]);
            return Ok(index.clone());
        }

        let index = Arc::new(
            build_index(transcript, &self.splitter, self.embedder.as_ref())
                .await
                .map_err(unavailable)?,
        );
        info!("Built transcript index with {} chunks", index.len());
        *cached = Some(index.clone());
        Ok(index)
    }

    /// Answer `question` from `index`.
    #[instrument(skip(self, index), fields(question = %question))]
    pub async fn query(&self, index: &TranscriptIndex, question: &str) -> Result<Answer> {
        let passages = if index.is_empty() {
            Vec::new()
        } else {
            let query_embedding = self.embedder.embed(question).await.map_err(unavailable)?;
            index.search(&query_embedding, self.top_k, self.min_score)
        };

        if passages.is_empty() {
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                passages,
                strategy: AnswerStrategy::Indexed,
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_passages_for_prompt(&passages));

        let user_prompt = self.prompts.render_with_custom(&self.prompts.answer.user, &vars);
        let system_prompt = self.prompts.render_with_custom(&self.prompts.answer.system, &vars);

        let text = self
            .llm
            .complete(&system_prompt, &user_prompt)
            .await
            .map_err(unavailable)?;

        debug!("Generated answer from {} passages", passages.len());

        Ok(Answer {
            text,
            passages,
            strategy: AnswerStrategy::Indexed,
        })
    }
}

#[async_trait]
impl AnswerEngine for IndexedAnswerEngine {
    fn strategy(&self) -> AnswerStrategy {
        AnswerStrategy::Indexed
    }

    async fn answer(&self, transcript: &Transcript, question: &str) -> Result<Answer> {
        let index = self.index_for(transcript).await?;
        self.query(&index, question).await
    }
}

//! In-memory embedding index over one transcript.

use super::splitter::TextSplitter;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::Transcript;
use serde::Serialize;
use tracing::{debug, instrument};

/// A transcript excerpt with its embedding.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    /// Position of the chunk in the transcript.
    pub order: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A chunk selected for a question, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    pub order: usize,
    pub content: String,
    pub score: f32,
}

/// Embedded chunks of a single transcript.
#[derive(Debug, Clone)]
pub struct TranscriptIndex {
    content_hash: String,
    chunks: Vec<IndexedChunk>,
}

impl TranscriptIndex {
    /// Hash of the transcript text this index was built from.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `limit` chunks most similar to `query_embedding`, best first.
    pub fn search(&self, query_embedding: &[f32], limit: usize, min_score: f32) -> Vec<Passage> {
        let mut scored: Vec<Passage> = self
            .chunks
            .iter()
            .map(|chunk| Passage {
                order: chunk.order,
                content: chunk.content.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
            })
            .filter(|p| p.score >= min_score)
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.order.cmp(&b.order)));
        scored.truncate(limit);
        scored
    }
}

/// Split and embed a transcript.
#[instrument(skip_all, fields(words = transcript.word_count()))]
pub async fn build_index(
    transcript: &Transcript,
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
) -> Result<TranscriptIndex> {
    let contents = splitter.split(&transcript.text);
    let embeddings = embedder.embed_batch(&contents).await?;

    let chunks: Vec<IndexedChunk> = contents
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(order, (content, embedding))| IndexedChunk {
            order,
            content,
            embedding,
        })
        .collect();

    debug!("Indexed transcript into {} chunks", chunks.len());

    Ok(TranscriptIndex {
        content_hash: transcript.content_hash(),
        chunks,
    })
}

/// Format passages as numbered excerpts for a prompt.
pub fn format_passages_for_prompt(passages: &[Passage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("---\n[{}]\n{}\n---", i + 1, passage.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

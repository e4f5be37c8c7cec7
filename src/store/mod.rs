//! Single-slot transcript storage.
//!
//! Holds exactly one transcript: the most recent one. Every write replaces the
//! previous value; nothing is appended or versioned.

mod file;
mod memory;

pub use file::{FileTranscriptStore, TRANSCRIPT_FILE_NAME};
pub use memory::MemoryTranscriptStore;

use crate::error::Result;
use crate::media::MediaReference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The completed text of a transcription job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Transcript text.
    pub text: String,
    /// Provider job identifier, when known.
    pub job_id: Option<String>,
    /// Link the audio was taken from, when known.
    pub source: Option<MediaReference>,
    /// When the transcription completed.
    pub completed_at: DateTime<Utc>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            job_id: None,
            source: None,
            completed_at: Utc::now(),
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_source(mut self, source: MediaReference) -> Self {
        self.source = Some(source);
        self
    }

    /// SHA-256 of the transcript text, hex encoded.
    pub fn content_hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.text.as_bytes()))
    }

    /// Number of whitespace separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Single-slot, last-write-wins transcript storage.
pub trait TranscriptStore: Send + Sync {
    /// Replace the stored transcript.
    fn write(&self, transcript: &Transcript) -> Result<()>;

    /// The stored transcript.
    ///
    /// Fails with [`crate::error::ChatAudioError::NoTranscriptAvailable`] if
    /// nothing was written in this session.
    fn read(&self) -> Result<Transcript>;

    /// Content hash of the stored transcript, if any.
    fn revision(&self) -> Option<String> {
        self.read().ok().map(|t| t.content_hash())
    }
}

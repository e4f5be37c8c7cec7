//! In-memory transcript store.
//!
//! Useful for testing and for sessions that don't need the transcript on disk.

use super::{Transcript, TranscriptStore};
use crate::error::{ChatAudioError, Result};
use std::sync::RwLock;

/// In-memory single-slot store.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    slot: RwLock<Option<Transcript>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn write(&self, transcript: &Transcript) -> Result<()> {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(transcript.clone());
        Ok(())
    }

    fn read(&self) -> Result<Transcript> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(ChatAudioError::NoTranscriptAvailable)
    }
}

//! File-backed transcript store.

use super::{Transcript, TranscriptStore};
use crate::error::{ChatAudioError, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Name of the plain-text file holding the latest transcript.
pub const TRANSCRIPT_FILE_NAME: &str = "transcription.txt";

/// Keeps the latest transcript in `<dir>/transcription.txt`.
///
/// The file is replaced atomically on every write, so a reader never sees a
/// half-written transcript.
pub struct FileTranscriptStore {
    path: PathBuf,
    current: RwLock<Option<Transcript>>,
}

impl FileTranscriptStore {
    /// Start a fresh session in `dir`.
    ///
    /// A file left behind by an earlier process is not readable until this
    /// session writes its own transcript.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TRANSCRIPT_FILE_NAME),
            current: RwLock::new(None),
        }
    }

    /// Adopt the transcript left in `dir` by an earlier session, if any.
    pub fn resume(dir: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(dir);

        if store.path.exists() {
            let text = std::fs::read_to_string(&store.path)?;
            let modified = std::fs::metadata(&store.path)?.modified()?;

            let mut transcript = Transcript::new(text);
            transcript.completed_at = DateTime::<Utc>::from(modified);

            info!("Resumed transcript from {}", store.path.display());
            *store.current.write().unwrap_or_else(|e| e.into_inner()) = Some(transcript);
        }

        Ok(store)
    }

    /// Location of the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn write(&self, transcript: &Transcript) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| ChatAudioError::Config("transcript path has no parent directory".into()))?;
        std::fs::create_dir_all(dir)?;

        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(transcript.text.as_bytes())?;
        staged.flush()?;
        staged.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote {} bytes to {}", transcript.text.len(), self.path.display());

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(transcript.clone());
        Ok(())
    }

    fn read(&self) -> Result<Transcript> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(ChatAudioError::NoTranscriptAvailable)
    }
}

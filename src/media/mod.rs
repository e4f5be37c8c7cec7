//! Media fetching: from a video link to a local audio file.
//!
//! The download itself is delegated to external tools; this module defines the
//! capability contract the rest of the pipeline depends on.

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use crate::error::{ChatAudioError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

/// A URL identifying a remote video or audio resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference(String);

impl MediaReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the reference as an absolute http(s) URL.
    pub fn parse_url(&self) -> Result<Url> {
        let url = Url::parse(&self.0)
            .map_err(|e| ChatAudioError::MediaUnavailable(format!("'{}' is not a valid URL: {}", self.0, e)))?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            _ => Err(ChatAudioError::MediaUnavailable(format!(
                "'{}' is not an http(s) link",
                self.0
            ))),
        }
    }

    /// Extract the YouTube video ID, if this is a YouTube link.
    pub fn youtube_id(&self) -> Option<String> {
        static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
        let regex = VIDEO_ID.get_or_init(|| {
            Regex::new(
                r"(?x)
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            ",
            )
            .expect("video id pattern is valid")
        });

        regex
            .captures(&self.0)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A local audio file extracted from a [`MediaReference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    path: PathBuf,
    source: MediaReference,
}

impl AudioArtifact {
    pub fn new(path: PathBuf, source: MediaReference) -> Self {
        Self { path, source }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &MediaReference {
        &self.source
    }

    /// File name used when uploading the artifact.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string()
    }

    /// Remove the audio file from disk.
    pub fn discard(self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed audio artifact {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove audio artifact {}: {}", self.path.display(), e),
        }
    }
}

/// Capability: resolve a media link to a local audio artifact.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the audio track of `reference`.
    ///
    /// Fails with [`ChatAudioError::MediaUnavailable`] when the link is malformed,
    /// cannot be resolved, or has no extractable audio.
    async fn fetch(&self, reference: &MediaReference) -> Result<AudioArtifact>;
}

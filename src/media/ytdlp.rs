//! yt-dlp based media fetcher.

use super::{AudioArtifact, MediaFetcher, MediaReference};
use crate::error::{ChatAudioError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Downloads the audio track of a link with yt-dlp, normalizing it to MP3.
///
/// Dropping an in-flight fetch kills the child processes and removes any
/// partial download.
pub struct YtDlpFetcher {
    output_dir: PathBuf,
    yt_dlp: PathBuf,
    ffmpeg: PathBuf,
}

impl YtDlpFetcher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }

    /// Use the given executables instead of `yt-dlp` and `ffmpeg` from `PATH`.
    pub fn with_tools(mut self, yt_dlp: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        self.yt_dlp = yt_dlp.into();
        self.ffmpeg = ffmpeg.into();
        self
    }
}

/// Removes every `<stem>*` file in a directory when dropped, except the kept one.
struct StagedFiles<'a> {
    dir: &'a Path,
    stem: &'a str,
    keep: Option<PathBuf>,
}

impl<'a> StagedFiles<'a> {
    fn new(dir: &'a Path, stem: &'a str) -> Self {
        Self { dir, stem, keep: None }
    }

    fn keep(&mut self, path: &Path) {
        self.keep = Some(path.to_path_buf());
    }
}

impl Drop for StagedFiles<'_> {
    fn drop(&mut self) {
        let Ok(entries) = std::fs::read_dir(self.dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !entry.file_name().to_string_lossy().starts_with(self.stem) {
                continue;
            }
            if self.keep.as_deref() == Some(path.as_path()) {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    #[instrument(skip(self), fields(reference = %reference))]
    async fn fetch(&self, reference: &MediaReference) -> Result<AudioArtifact> {
        let url = reference.parse_url()?;
        std::fs::create_dir_all(&self.output_dir)?;

        let stem = Uuid::new_v4().simple().to_string();
        let target_path = self.output_dir.join(format!("{}.mp3", stem));
        let template = self.output_dir.join(format!("{}.%(ext)s", stem));
        let mut staged = StagedFiles::new(&self.output_dir, &stem);

        info!("Downloading audio from {}", url);

        let result = Command::new(&self.yt_dlp)
            .arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--audio-quality").arg("0")
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(url.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChatAudioError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(ChatAudioError::MediaUnavailable(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChatAudioError::MediaUnavailable(format!(
                "could not extract audio from {}: {}",
                reference,
                stderr.trim()
            )));
        }

        let downloaded = find_audio_file(&self.output_dir, &stem)?;

        if downloaded != target_path {
            normalize_to_mp3(&self.ffmpeg, &downloaded, &target_path).await?;
        }

        staged.keep(&target_path);
        Ok(AudioArtifact::new(target_path, reference.clone()))
    }
}

/// Locates a downloaded audio file by its file stem.
fn find_audio_file(dir: &Path, stem: &str) -> Result<PathBuf> {
    for ext in ["mp3", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let entries = std::fs::read_dir(dir)?;
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with(stem) {
            return Ok(entry.path());
        }
    }

    Err(ChatAudioError::MediaUnavailable(
        "no audio stream was extracted from the link".into(),
    ))
}

/// Converts an audio file to MP3 using ffmpeg.
async fn normalize_to_mp3(ffmpeg: &Path, source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new(ffmpeg)
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(ChatAudioError::MediaUnavailable(format!("ffmpeg conversion failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ChatAudioError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(ChatAudioError::MediaUnavailable(format!("ffmpeg error: {e}"))),
    }
}

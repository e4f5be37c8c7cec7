//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Credentials;
use crate::error::{ChatAudioError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching and transcribing media needs yt-dlp, ffmpeg and both keys.
    Transcribe,
    /// Asking about a stored transcript needs both keys.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns the credentials on success so callers never read the environment twice.
pub fn check(operation: Operation) -> Result<Credentials> {
    let credentials = Credentials::from_env()?;

    match operation {
        Operation::Transcribe => {
            check_tool("yt-dlp")?;
            check_tool("ffmpeg")?;
        }
        Operation::Ask => {}
    }

    Ok(credentials)
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg(version_arg(name)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ChatAudioError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ChatAudioError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ChatAudioError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// ffmpeg/ffprobe use -version (single dash), others use --version.
pub fn version_arg(name: &str) -> &'static str {
    match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

//! Configuration settings for ChatAudio.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub retry: RetrySettings,
    pub answer: AnswerSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding the latest transcript.
    pub output_dir: String,
    /// Directory for downloaded audio.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "docs".to_string(),
            temp_dir: "/tmp/chataudio".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcription provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Base URL of the transcription provider API.
    pub base_url: String,
    /// Seconds between status checks. Values below 1 are raised to 1.
    pub poll_interval_secs: u64,
    /// Give up waiting after this many seconds. 0 disables the deadline.
    pub timeout_secs: u64,
    /// Give up after this many status checks.
    pub max_poll_attempts: Option<u32>,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com".to_string(),
            poll_interval_secs: 3,
            timeout_secs: 1800, // 30 minutes
            max_poll_attempts: None,
            request_timeout_secs: 300,
        }
    }
}

impl TranscriptionSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry settings for transient provider failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for the delay between retries, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

/// Answer engine strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStrategy {
    /// Local index over the transcript plus an LLM completion.
    #[default]
    Indexed,
    /// Hosted question-answering endpoint of the transcription provider.
    Direct,
}

impl std::str::FromStr for AnswerStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indexed" | "index" | "rag" => Ok(AnswerStrategy::Indexed),
            "direct" | "lemur" => Ok(AnswerStrategy::Direct),
            _ => Err(format!("Unknown answer strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerStrategy::Indexed => write!(f, "indexed"),
            AnswerStrategy::Direct => write!(f, "direct"),
        }
    }
}

/// Answer engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    /// Which answer strategy to use.
    pub strategy: AnswerStrategy,
    /// LLM model for answer composition.
    pub model: String,
    /// Embedding model for the transcript index.
    pub embedding_model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Characters per indexed chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Minimum similarity for a chunk to be used.
    pub min_score: f32,
    /// Sampling temperature for the completion.
    pub temperature: f32,
    /// Answer format hint for the hosted endpoint.
    pub answer_format: String,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            strategy: AnswerStrategy::Indexed,
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            chunk_size: 1000,
            chunk_overlap: 0,
            top_k: 4,
            min_score: 0.0,
            temperature: 0.7,
            answer_format: "a short paragraph".to_string(),
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ChatAudioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chataudio")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded transcript output directory.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.transcription.poll_interval(), Duration::from_secs(3));
        assert_eq!(settings.general.output_dir, "docs");
        assert_eq!(settings.answer.strategy, AnswerStrategy::Indexed);
        assert_eq!(settings.answer.chunk_size, 1000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [answer]
            strategy = "direct"

            [transcription]
            timeout_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(settings.answer.strategy, AnswerStrategy::Direct);
        assert_eq!(settings.answer.model, "gpt-4o-mini");
        assert_eq!(settings.transcription.timeout(), None);
        assert_eq!(settings.transcription.poll_interval_secs, 3);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("RAG".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::Indexed);
        assert_eq!("lemur".parse::<AnswerStrategy>().unwrap(), AnswerStrategy::Direct);
        assert!("magic".parse::<AnswerStrategy>().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 9000;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 9000);
    }
}

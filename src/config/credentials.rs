//! API keys for the transcription and language-model providers.

use crate::error::{ChatAudioError, Result};
use std::fmt;

/// Environment variable holding the transcription provider key.
pub const TRANSCRIPTION_KEY_VAR: &str = "ASSEMBLY_AI_KEY";

/// Environment variable holding the language-model provider key.
pub const LLM_KEY_VAR: &str = "OPENAI_API_KEY";

/// Provider secrets, passed explicitly to each client constructor.
#[derive(Clone)]
pub struct Credentials {
    pub transcription_api_key: String,
    pub llm_api_key: String,
}

impl Credentials {
    /// Read both keys from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both keys through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => Err(ChatAudioError::ConfigurationMissing(name.to_string())),
            }
        };

        Ok(Self {
            transcription_api_key: require(TRANSCRIPTION_KEY_VAR)?,
            llm_api_key: require(LLM_KEY_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("transcription_api_key", &mask(&self.transcription_api_key))
            .field("llm_api_key", &mask(&self.llm_api_key))
            .finish()
    }
}

/// Mask a secret for display, keeping only the last four characters.
pub fn mask(secret: &str) -> String {
    let visible: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", visible)
    }
}

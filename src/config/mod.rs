//! Configuration module for ChatAudio.
//!
//! Handles loading application settings, provider credentials and prompt templates.

mod credentials;
mod prompts;
mod settings;

pub use credentials::{mask, Credentials, LLM_KEY_VAR, TRANSCRIPTION_KEY_VAR};
pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    AnswerSettings, AnswerStrategy, GeneralSettings, PromptSettings, RetrySettings, ServerSettings,
    Settings, TranscriptionSettings,
};

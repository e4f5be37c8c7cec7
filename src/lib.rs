//! ChatAudio - chat with your audio
//!
//! Paste a video link; its audio is extracted, transcribed by a remote
//! speech-to-text service, and questions about it are answered either from a
//! local retrieval index or by the provider's question-answering endpoint.
//!
//! # Architecture
//!
//! - `config` - Settings, credentials and prompt templates
//! - `media` - From a video link to a local audio file
//! - `transcription` - Submitting audio and waiting for the transcript
//! - `retry` - Bounded retry for transient provider failures
//! - `store` - Single-slot storage of the latest transcript
//! - `embedding` - Embedding generation
//! - `answer` - Answer engines (indexed retrieval or direct endpoint)
//! - `controller` - The user session tying it all together
//! - `web` - The single-page HTTP surface
//!
//! # Example
//!
//! ```rust,no_run
//! use chataudio::config::{Credentials, Settings};
//! use chataudio::controller::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = Credentials::from_env()?;
//!     let mut session = Session::from_settings(&settings, &credentials)?;
//!
//!     session.submit_media("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     let answer = session.ask("What is the song about?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod cli;
pub mod config;
pub mod controller;
pub mod embedding;
pub mod error;
pub mod media;
pub mod openai;
pub mod retry;
pub mod store;
pub mod transcription;
pub mod web;

#[cfg(test)]
mod testing;

pub use error::{ChatAudioError, Result};

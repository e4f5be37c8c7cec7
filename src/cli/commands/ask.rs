//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{AnswerStrategy, Settings};
use crate::controller::Session;
use crate::error::ChatAudioError;
use crate::store::{FileTranscriptStore, TranscriptStore};
use anyhow::Result;
use std::sync::Arc;

/// Answer `question` about the transcript left by the last `transcribe` run.
pub async fn run_ask(
    question: &str,
    strategy: Option<AnswerStrategy>,
    transcript_id: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(strategy) = strategy {
        settings.answer.strategy = strategy;
    }

    let credentials = match preflight::check(Operation::Ask) {
        Ok(credentials) => credentials,
        Err(e) => {
            Output::error(&e.to_string());
            Output::info("Run 'chataudio doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    };

    let store = Arc::new(FileTranscriptStore::resume(settings.output_dir())?);
    let mut transcript = match store.read() {
        Ok(transcript) => transcript,
        Err(e) => {
            Output::error(&e.to_string());
            Output::info("Transcribe a video first with: chataudio transcribe <url>");
            return Err(e.into());
        }
    };
    if let Some(id) = transcript_id {
        transcript = transcript.with_job_id(id);
    }

    if settings.answer.strategy == AnswerStrategy::Direct && transcript.job_id.is_none() {
        let e = ChatAudioError::InvalidInput(
            "the direct strategy needs the provider transcript id; pass it with --transcript-id".to_string(),
        );
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let mut session = Session::from_settings_with_store(&settings, &credentials, store)?;
    session.adopt(transcript);

    let spinner = Output::spinner("Thinking...");
    let result = session.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(answer) => {
            Output::answer(&answer);
            Ok(())
        }
        Err(e) => {
            Output::error(&e.to_string());
            Err(e.into())
        }
    }
}

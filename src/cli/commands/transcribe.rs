//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::controller::Session;
use crate::store::TRANSCRIPT_FILE_NAME;
use crate::transcription::cancel_pair;
use anyhow::Result;

/// Fetch, transcribe and store the audio behind `url`.
pub async fn run_transcribe(url: &str, settings: Settings) -> Result<()> {
    let credentials = match preflight::check(Operation::Transcribe) {
        Ok(credentials) => credentials,
        Err(e) => {
            Output::error(&e.to_string());
            Output::info("Run 'chataudio doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    };

    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut session = Session::from_settings(&settings, &credentials)?.with_cancel_signal(signal);

    let spinner = Output::spinner("Fetching audio and transcribing...");
    let result = session.submit_media(url).await;
    spinner.finish_and_clear();

    match result {
        Ok(transcript) => {
            Output::transcript(&transcript);
            Output::success(&format!(
                "Saved to {}",
                settings.output_dir().join(TRANSCRIPT_FILE_NAME).display()
            ));
            Output::info("Ask about it with: chataudio ask \"<question>\"");
            Ok(())
        }
        Err(e) => {
            Output::error(&e.to_string());
            Err(e.into())
        }
    }
}

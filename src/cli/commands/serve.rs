//! Serve the ChatAudio web page.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::controller::Session;
use crate::web::{router, AppState};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP server until Ctrl+C.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    let credentials = match preflight::check(Operation::Transcribe) {
        Ok(credentials) => credentials,
        Err(e) => {
            Output::error(&e.to_string());
            Output::info("Run 'chataudio doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    };

    let session = Session::from_settings(&settings, &credentials)?;
    let app = router(Arc::new(AppState::new(session)));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("ChatAudio");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Answer strategy", &settings.answer.strategy.to_string());
    Output::kv("Transcript file", &settings.output_dir().display().to_string());
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

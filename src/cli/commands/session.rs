//! Interactive terminal session: a video link, then questions.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{AnswerStrategy, Settings};
use crate::controller::Session;
use crate::error::Result;
use crate::media::MediaReference;
use console::style;
use std::io::{self, BufRead, Write};

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Help,
    Media(&'a str),
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();

    if line.is_empty() {
        Input::Empty
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else if line.eq_ignore_ascii_case("help") {
        Input::Help
    } else if MediaReference::new(line).parse_url().is_ok() && !line.contains(char::is_whitespace) {
        Input::Media(line)
    } else {
        Input::Question(line)
    }
}

/// Run the interactive session.
pub async fn run_session(url: Option<String>, strategy: Option<AnswerStrategy>, mut settings: Settings) -> Result<()> {
    if let Some(strategy) = strategy {
        settings.answer.strategy = strategy;
    }

    let credentials = match preflight::check(Operation::Transcribe) {
        Ok(credentials) => credentials,
        Err(e) => {
            Output::error(&e.to_string());
            Output::info("Run 'chataudio doctor' for detailed diagnostics.");
            return Err(e);
        }
    };

    let mut session = Session::from_settings(&settings, &credentials)?;

    println!("\n{}", style("ChatAudio").bold().cyan());
    println!(
        "{}\n",
        style("Paste a video link to transcribe it, then ask questions. Type 'exit' to quit.").dim()
    );

    if let Some(url) = url {
        submit(&mut session, &url).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let prompt = if session.transcript().is_some() { "You:" } else { "Link:" };
        print!("{} ", style(prompt).green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match classify(&line) {
            Input::Empty => continue,
            Input::Exit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Help => {
                Output::list_item("paste an http(s) link to transcribe a new video");
                Output::list_item("type a question to ask about the current transcript");
                Output::list_item("'exit' quits");
            }
            Input::Media(url) => submit(&mut session, url).await,
            Input::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = session.ask(question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(answer) => Output::answer(&answer),
                    Err(e) if e.is_usage_error() => Output::warning(&e.to_string()),
                    Err(e) => Output::error(&e.to_string()),
                }
            }
        }
    }

    Ok(())
}

/// Transcribe `url`, aborting on Ctrl+C.
async fn submit(session: &mut Session, url: &str) {
    let spinner = Output::spinner("Fetching audio and transcribing...");

    let result = tokio::select! {
        result = session.submit_media(url) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    spinner.finish_and_clear();

    match result {
        Some(Ok(transcript)) => Output::transcript(&transcript),
        Some(Err(e)) => Output::error(&e.to_string()),
        None => Output::warning("Transcription cancelled."),
    }
}

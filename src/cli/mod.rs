//! CLI module for ChatAudio.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::AnswerStrategy;
use clap::{Parser, Subcommand};

/// ChatAudio - chat with your audio
///
/// Paste a video link, get its transcript, then ask questions about it.
#[derive(Parser, Debug)]
#[command(name = "chataudio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the ChatAudio web page
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Interactive terminal session: a video link, then questions
    Session {
        /// Video link to start with
        url: Option<String>,

        /// Answer strategy (indexed or direct)
        #[arg(short, long)]
        strategy: Option<AnswerStrategy>,
    },

    /// Transcribe a video link and store the transcript
    Transcribe {
        /// Video link
        url: String,
    },

    /// Ask a question about the stored transcript
    Ask {
        /// The question to ask
        question: String,

        /// Answer strategy (indexed or direct)
        #[arg(short, long)]
        strategy: Option<AnswerStrategy>,

        /// Provider transcript id, required by the direct strategy
        #[arg(short = 't', long)]
        transcript_id: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

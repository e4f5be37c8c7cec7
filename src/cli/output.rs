//! CLI output formatting utilities.

use crate::answer::Answer;
use crate::store::Transcript;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a finished transcript with its metadata.
    pub fn transcript(transcript: &Transcript) {
        Output::header("Transcript");
        if let Some(source) = &transcript.source {
            Output::kv("Source", source.as_str());
        }
        if let Some(job_id) = &transcript.job_id {
            Output::kv("Transcript id", job_id);
        }
        Output::kv("Words", &transcript.word_count().to_string());
        println!("\n{}\n", transcript.text);
    }

    /// Print an answer and the excerpts it was built from.
    pub fn answer(answer: &Answer) {
        println!("\n{}\n", answer.text);

        if !answer.passages.is_empty() {
            println!("{}", style("Transcript excerpts").dim());
            for passage in &answer.passages {
                println!(
                    "  {} {} {}",
                    style(format!("[{}]", passage.order + 1)).cyan(),
                    content_preview(&passage.content, 160),
                    style(format!("(score: {:.2})", passage.score)).dim()
                );
            }
            println!();
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Collapse newlines and truncate with an ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

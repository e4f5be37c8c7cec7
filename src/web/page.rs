//! HTML rendering for the single ChatAudio page.

use crate::answer::Answer;
use crate::controller::{Session, SessionState};
use crate::media::MediaReference;

/// Everything the page shows.
#[derive(Debug, Default, Clone)]
pub struct PageView {
    pub media: Option<MediaReference>,
    pub transcript: Option<String>,
    pub question: Option<String>,
    pub answer: Option<Answer>,
    pub error: Option<String>,
}

impl PageView {
    /// The page for the session's current state.
    pub fn from_session(session: &Session) -> Self {
        let mut view = PageView {
            media: session.media().cloned(),
            transcript: session.transcript().map(|t| t.text.clone()),
            ..Default::default()
        };
        if let SessionState::Failed { reason, .. } = session.state() {
            view.error = Some(reason.clone());
        }
        view
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1200px; padding: 1rem 2rem; }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; }
.info { background: #e8f0fe; border-radius: 6px; padding: 0.75rem 1rem; white-space: pre-wrap; }
.success { background: #e6f4ea; border-radius: 6px; padding: 0.75rem 1rem; white-space: pre-wrap; }
.error { background: #fce8e6; border-radius: 6px; padding: 0.75rem 1rem; }
input[type=url], textarea { width: 100%; box-sizing: border-box; padding: 0.5rem; }
iframe, video { width: 100%; aspect-ratio: 16 / 9; border: 0; }
details { margin-top: 0.5rem; font-size: 0.9em; }
"#;

/// Render the full page.
pub fn render_page(view: &PageView) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>ChatAudio</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<h1>Chat with Your Audio using LLM</h1>\n");

    let url = view.media.as_ref().map(|m| m.as_str()).unwrap_or_default();
    html.push_str(&format!(
        "<form method=\"post\" action=\"/media\">\n<label for=\"url\">Enter the video URL</label>\n\
         <input type=\"url\" id=\"url\" name=\"url\" value=\"{}\" required>\n\
         <button type=\"submit\">Transcribe</button>\n</form>\n",
        escape(url)
    ));

    if let Some(error) = &view.error {
        html.push_str(&format!("<p class=\"error\" role=\"alert\">{}</p>\n", escape(error)));
    }

    if let Some(media) = &view.media {
        html.push_str("<div class=\"columns\">\n<section>\n<p class=\"info\">Your uploaded video</p>\n");
        html.push_str(&render_preview(media));
        if let Some(transcript) = &view.transcript {
            html.push_str(&format!("<div class=\"info\" id=\"transcript\">{}</div>\n", escape(transcript)));
        }
        html.push_str("</section>\n<section>\n<p class=\"info\">Chat Below</p>\n");

        if view.transcript.is_some() {
            let question = view.question.as_deref().unwrap_or_default();
            html.push_str(&format!(
                "<form method=\"post\" action=\"/ask\">\n\
                 <textarea name=\"question\" rows=\"4\" placeholder=\"Ask your Query here...\">{}</textarea>\n\
                 <button type=\"submit\">Ask</button>\n</form>\n",
                escape(question)
            ));
        }

        if let (Some(question), Some(answer)) = (&view.question, &view.answer) {
            html.push_str(&format!("<p class=\"info\">Your Query is: {}</p>\n", escape(question)));
            html.push_str(&format!("<div class=\"success\" id=\"answer\">{}</div>\n", escape(&answer.text)));
            if !answer.passages.is_empty() {
                html.push_str("<details>\n<summary>Transcript excerpts</summary>\n<ol>\n");
                for passage in &answer.passages {
                    html.push_str(&format!(
                        "<li>{} <small>(score {:.2})</small></li>\n",
                        escape(&passage.content),
                        passage.score
                    ));
                }
                html.push_str("</ol>\n</details>\n");
            }
        }

        html.push_str("</section>\n</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Embedded player for `media`: a YouTube iframe when possible, else a plain video tag.
pub fn render_preview(media: &MediaReference) -> String {
    match media.youtube_id() {
        Some(id) => format!(
            "<iframe src=\"https://www.youtube.com/embed/{}\" title=\"Video preview\" allowfullscreen></iframe>\n",
            escape(&id)
        ),
        None => format!("<video controls src=\"{}\"></video>\n", escape(media.as_str())),
    }
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

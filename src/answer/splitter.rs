//! Character-window text splitting.

/// Splits text into windows of at most `chunk_size` characters.
///
/// A window ends at the last whitespace inside it when there is one, so words
/// are not cut in half unless a single word is longer than the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total_len = chars.len();
        let mut chunks = Vec::new();

        let mut offset = 0;
        while offset < total_len {
            let mut end = (offset + self.chunk_size).min(total_len);

            if end < total_len {
                if let Some(space) = chars[offset..end].iter().rposition(|c| c.is_whitespace()) {
                    if space > 0 {
                        end = offset + space;
                    }
                }
            }

            let chunk: String = chars[offset..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end >= total_len {
                break;
            }

            let step = (end - offset).saturating_sub(self.chunk_overlap).max(1);
            offset += step;
        }

        chunks
    }
}

//! Splitting extracted text into slide-sized chunks.

/// Default cap on chunks taken from one document.
pub const DEFAULT_MAX_CHUNKS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chunks: usize,
    /// Paragraphs are merged until a chunk holds at least this many characters.
    pub min_chars: usize,
    /// Chunks are cut at a word boundary before exceeding this many characters.
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunks: DEFAULT_MAX_CHUNKS,
            min_chars: 200,
            max_chars: 1_500,
        }
    }
}

/// Split on blank lines, merge short paragraphs, cut long ones, cap the count.
#[must_use]
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs(text) {
        for piece in split_long(&paragraph, config.max_chars) {
            if !current.is_empty() && current.len() + piece.len() + 1 > config.max_chars {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(piece);
            if current.len() >= config.min_chars {
                chunks.push(std::mem::take(&mut current));
            }
        }
        if chunks.len() >= config.max_chunks {
            break;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.truncate(config.max_chunks);
    chunks
}

/// Blank-line separated paragraphs with inner whitespace collapsed.
fn paragraphs(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split("\n\n")
        .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|block| !block.is_empty())
}

fn split_long(paragraph: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = paragraph;
    while rest.len() > max_chars {
        let mut window = floor_char_boundary(rest, max_chars);
        if window == 0 {
            window = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let cut = rest[..window].rfind(' ').filter(|&at| at > 0).unwrap_or(window);
        pieces.push(rest[..cut].trim_end());
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    (0..=index.min(text.len()))
        .rev()
        .find(|&at| text.is_char_boundary(at))
        .unwrap_or(0)
}

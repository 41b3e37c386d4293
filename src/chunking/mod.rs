
use pulldown_cmark::{Event, Options, Parser, Tag};
use tracing::debug;

/// A bounded piece of a document's normalized text, the unit stored and
/// retrieved from the vector store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Position within the parent document, used for reconstruction and
    /// debugging only.
    pub sequence_index: usize,
}

/// Chunking strategy. A closed set: there are exactly two ways this tool
/// splits text, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Fixed-size sliding window with exact character overlap, preferring
    /// paragraph and sentence boundaries inside the window.
    Recursive,
    /// Split at Markdown heading boundaries; oversize sections fall back
    /// to the recursive strategy.
    Semantic,
}

/// Splits normalized text into retrieval chunks.
///
/// Invariant (enforced by configuration validation, assumed here):
/// `overlap < max_chunk_size`. Sizes are in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSplitter {
    strategy: SplitStrategy,
    max_chunk_size: usize,
    overlap: usize,
}

impl ChunkSplitter {
    #[inline]
    pub fn new(strategy: SplitStrategy, max_chunk_size: usize, overlap: usize) -> Self {
        debug_assert!(overlap < max_chunk_size);
        Self {
            strategy,
            max_chunk_size,
            overlap,
        }
    }

    /// Split text into an ordered, finite chunk sequence. Empty (or
    /// whitespace-only) input yields an empty sequence, not a single empty
    /// chunk. Deterministic: the same input and configuration always
    /// produce the same chunks.
    #[inline]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let pieces = match self.strategy {
            SplitStrategy::Recursive => {
                sliding_window_split(text, self.max_chunk_size, self.overlap)
            }
            SplitStrategy::Semantic => {
                heading_split(text, self.max_chunk_size, self.overlap)
            }
        };

        debug!(
            "Split {} chars into {} chunks ({:?})",
            text.chars().count(),
            pieces.len(),
            self.strategy
        );

        pieces
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| Chunk {
                text,
                sequence_index,
            })
            .collect()
    }
}

/// Fixed-size strategy: slide a window of `max` characters, keeping exactly
/// `overlap` characters shared between consecutive chunks.
///
/// Each cut prefers the last paragraph break in the window, then the last
/// sentence break, then a hard cut at the size limit. Whatever the cut, the
/// next window starts `overlap` characters before it, so the boundary
/// equality between adjacent chunks holds exactly.
fn sliding_window_split(text: &str, max: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary; positions below are char indexed.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    #[expect(clippy::string_slice, reason = "all offsets come from char_indices")]
    let slice = |from: usize, to: usize| text[bounds[from]..bounds[to]].to_string();

    if total <= max {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + max).min(total);
        if end == total {
            chunks.push(slice(start, total));
            break;
        }

        let cut = find_cut(&chars, start, end, overlap);
        chunks.push(slice(start, cut));
        start = cut - overlap;
    }

    chunks
}

/// Pick the cut position in `(start + overlap, end]`, preferring paragraph
/// then sentence boundaries. The lower bound keeps every chunk longer than
/// the overlap, which guarantees forward progress.
fn find_cut(chars: &[char], start: usize, end: usize, overlap: usize) -> usize {
    let floor = start + overlap + 1;

    let mut sentence_cut = None;
    for pos in (floor..=end).rev() {
        if pos >= 2 && chars[pos - 1] == '\n' && chars[pos - 2] == '\n' {
            return pos;
        }
        if sentence_cut.is_none()
            && pos >= 1
            && matches!(chars[pos - 1], '.' | '!' | '?')
            && chars.get(pos).is_some_and(|c| c.is_whitespace())
        {
            sentence_cut = Some(pos);
        }
    }

    sentence_cut.unwrap_or(end)
}

/// Structural strategy: one candidate section per Markdown heading.
///
/// Heading offsets come from the Markdown parser, so markers inside fenced
/// code blocks are not boundaries. Oversize sections are re-split with the
/// sliding window at the same overlap; undersized sections are kept as-is,
/// heading boundaries are meaningful retrieval units and never merged.
fn heading_split(text: &str, max: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut boundaries = vec![0];
    boundaries.extend(heading_offsets(text));
    boundaries.push(text.len());
    boundaries.dedup();

    let mut sections = Vec::new();
    for pair in boundaries.windows(2) {
        #[expect(clippy::string_slice, reason = "offsets come from the parser's offset iter")]
        let section = &text[pair[0]..pair[1]];
        if section.trim().is_empty() {
            continue;
        }

        if section.chars().count() <= max {
            sections.push(section.to_string());
        } else {
            sections.extend(sliding_window_split(section, max, overlap));
        }
    }

    sections
}

/// Byte offsets where top-level Markdown headings start.
fn heading_offsets(text: &str) -> Vec<usize> {
    Parser::new_ext(text, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| {
            matches!(event, Event::Start(Tag::Heading { .. })).then_some(range.start)
        })
        .collect()
}

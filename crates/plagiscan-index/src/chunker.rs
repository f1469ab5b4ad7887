//! Line-aligned chunking with overlapping token windows as a fallback.
//!
//! Whole lines accumulate into a buffer until its whitespace-delimited token
//! count reaches the bound, so chunk boundaries always fall on line
//! boundaries. A chunk that still exceeds the bound (one very long line) is
//! re-split into fixed-size token windows that overlap, so a copied span
//! straddling a window edge is still fully contained in some window.

use std::ops::Range;

use plagiscan_core::IndexConfig;

/// Default token bound for logical chunks.
pub const DEFAULT_MAX_TOKENS: usize = 512;
/// Default fallback window size in tokens.
pub const DEFAULT_WINDOW: usize = 256;
/// Default overlap between consecutive fallback windows.
pub const DEFAULT_OVERLAP: usize = 64;

/// Chunking bounds.
///
/// # Examples
///
/// ```
/// use plagiscan_index::chunker::ChunkerConfig;
///
/// let config = ChunkerConfig::default();
/// assert_eq!(config.max_tokens, 512);
/// assert_eq!(config.window, 256);
/// assert_eq!(config.overlap, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Token bound for logical chunks.
    pub max_tokens: usize,
    /// Fallback window size in tokens.
    pub window: usize,
    /// Tokens repeated between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            window: DEFAULT_WINDOW,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl From<&IndexConfig> for ChunkerConfig {
    fn from(config: &IndexConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            window: config.window,
            overlap: config.overlap,
        }
    }
}

/// Number of whitespace-delimited tokens in `text`.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Iterator over the logical chunks of a text.
///
/// Each item is a run of consecutive lines joined with `\n`. Iteration is
/// finite and order-preserving; building a new iterator over the same text
/// restarts it. Blank input yields nothing.
///
/// # Examples
///
/// ```
/// use plagiscan_index::chunker::LogicalChunks;
///
/// let text = "a b\nc d\ne f\ng";
/// let chunks: Vec<String> = LogicalChunks::new(text, 4).collect();
/// assert_eq!(chunks, vec!["a b\nc d", "e f\ng"]);
/// ```
#[derive(Debug, Clone)]
pub struct LogicalChunks<'a> {
    lines: std::str::Lines<'a>,
    max_tokens: usize,
}

impl<'a> LogicalChunks<'a> {
    /// Chunk `text` so that each chunk closes as soon as it holds at least
    /// `max_tokens` tokens.
    pub fn new(text: &'a str, max_tokens: usize) -> Self {
        let text = if text.trim().is_empty() { "" } else { text };
        Self {
            lines: text.lines(),
            max_tokens,
        }
    }
}

impl Iterator for LogicalChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer: Vec<&str> = Vec::new();
        let mut tokens = 0;

        for line in self.lines.by_ref() {
            buffer.push(line);
            tokens += token_count(line);
            if tokens >= self.max_tokens {
                return Some(buffer.join("\n"));
            }
        }

        if buffer.is_empty() {
            None
        } else {
            Some(buffer.join("\n"))
        }
    }
}

/// Collect the logical chunks of `text`.
///
/// Joining the result with `\n` reproduces `text.lines()` joined with `\n`.
///
/// # Examples
///
/// ```
/// use plagiscan_index::chunker::logical_chunks;
///
/// assert!(logical_chunks("   \n\t\n", 512).is_empty());
/// assert_eq!(logical_chunks("x = 1\ny = 2\n", 512), vec!["x = 1\ny = 2"]);
/// ```
pub fn logical_chunks(text: &str, max_tokens: usize) -> Vec<String> {
    LogicalChunks::new(text, max_tokens).collect()
}

/// Token ranges of the sliding windows over `len` tokens.
///
/// Windows advance by `window - overlap` and stop once one reaches the end.
pub(crate) fn window_ranges(len: usize, window: usize, overlap: usize) -> Vec<Range<usize>> {
    let window = window.max(1);
    let step = window.saturating_sub(overlap).max(1);
    let mut ranges = Vec::new();
    let mut start = 0;

    while start < len {
        let end = (start + window).min(len);
        ranges.push(start..end);
        if end == len {
            break;
        }
        start += step;
    }

    ranges
}

/// Re-split `text` into overlapping windows of `window` tokens.
///
/// Tokens inside a window are joined with single spaces.
///
/// # Examples
///
/// ```
/// use plagiscan_index::chunker::fallback_windows;
///
/// let text = (0..10).map(|i| format!("t{i}")).collect::<Vec<_>>().join(" ");
/// let windows = fallback_windows(&text, 4, 2);
/// assert_eq!(windows[0], "t0 t1 t2 t3");
/// assert_eq!(windows[1], "t2 t3 t4 t5");
/// assert_eq!(windows.last().unwrap(), "t6 t7 t8 t9");
/// ```
pub fn fallback_windows(text: &str, window: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    window_ranges(words.len(), window, overlap)
        .into_iter()
        .map(|range| words[range].join(" "))
        .collect()
}

/// Full chunking for indexing: logical chunks, windowed when oversized.
///
/// Whitespace-only chunks are dropped since there is nothing to embed.
///
/// # Examples
///
/// ```
/// use plagiscan_index::chunker::{chunk_text, ChunkerConfig};
///
/// let config = ChunkerConfig { max_tokens: 8, window: 4, overlap: 1 };
/// let long_line = (0..10).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
/// let chunks = chunk_text(&long_line, &config);
/// assert_eq!(chunks, vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]);
///
/// assert_eq!(chunk_text("short line\n\n", &config), vec!["short line\n"]);
/// ```
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let mut chunks = Vec::new();

    for chunk in LogicalChunks::new(text, config.max_tokens) {
        let tokens = token_count(&chunk);
        if tokens == 0 {
            continue;
        }
        if tokens <= config.max_tokens {
            chunks.push(chunk);
        } else {
            chunks.extend(fallback_windows(&chunk, config.window, config.overlap));
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_produces_no_chunks() {
        assert!(logical_chunks("", 512).is_empty());
        assert!(logical_chunks("  \n \n\t", 512).is_empty());
        assert!(chunk_text("", &ChunkerConfig::default()).is_empty());
    }

    #[test]
    fn short_file_is_a_single_final_flush() {
        let text = "def f():\n    return 1\n\n\n";
        let chunks = logical_chunks(text, 512);
        assert_eq!(chunks, vec!["def f():\n    return 1\n\n"]);
    }

    #[test]
    fn chunks_close_when_bound_is_reached() {
        let text = "a b c\nd e\nf g h i\nj";
        let chunks = logical_chunks(text, 5);
        assert_eq!(chunks, vec!["a b c\nd e", "f g h i\nj"]);
    }

    #[test]
    fn iterator_restarts_from_scratch() {
        let text = "one two\nthree four\nfive";
        let first: Vec<String> = LogicalChunks::new(text, 2).collect();
        let second: Vec<String> = LogicalChunks::new(text, 2).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn default_windows_advance_by_192() {
        let ranges = window_ranges(600, DEFAULT_WINDOW, DEFAULT_OVERLAP);
        assert_eq!(ranges, vec![0..256, 192..448, 384..600]);
    }

    #[test]
    fn window_longer_than_text_is_one_window() {
        assert_eq!(window_ranges(10, 256, 64), vec![0..10]);
        assert!(window_ranges(0, 256, 64).is_empty());
    }

    #[test]
    fn degenerate_overlap_still_terminates() {
        let ranges = window_ranges(5, 2, 5);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges.last().unwrap().end, 5);
    }

    #[test]
    fn single_huge_line_is_windowed() {
        let line = (0..1000).map(|i| format!("x{i}")).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&line, &ChunkerConfig::default());
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(token_count(chunk) <= DEFAULT_WINDOW);
        }
        assert!(chunks[0].starts_with("x0 x1"));
        assert!(chunks.last().unwrap().ends_with("x999"));
    }

    #[test]
    fn chunk_at_bound_is_not_windowed() {
        let config = ChunkerConfig {
            max_tokens: 4,
            window: 2,
            overlap: 1,
        };
        let chunks = chunk_text("a b\nc d", &config);
        assert_eq!(chunks, vec!["a b\nc d"]);
    }

    proptest! {
        #[test]
        fn logical_chunks_cover_the_text(
            lines in prop::collection::vec("[a-z ]{0,20}", 0..40),
            max_tokens in 1usize..20,
        ) {
            let text = lines.join("\n");
            let chunks = logical_chunks(&text, max_tokens);
            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                let expected = text.lines().collect::<Vec<_>>().join("\n");
                prop_assert_eq!(chunks.join("\n"), expected);
            }
        }

        #[test]
        fn short_spans_fit_in_some_window(len in 1usize..2000, start_frac in 0.0f64..1.0, span in 1usize..=64) {
            let ranges = window_ranges(len, DEFAULT_WINDOW, DEFAULT_OVERLAP);
            let span = span.min(len);
            let max_start = len - span;
            let start = ((max_start as f64) * start_frac) as usize;
            let end = start + span;
            prop_assert!(
                ranges.iter().any(|r| r.start <= start && end <= r.end),
                "span {}..{} not contained in {:?}", start, end, ranges
            );
        }

        #[test]
        fn windows_cover_every_token(len in 1usize..2000) {
            let ranges = window_ranges(len, DEFAULT_WINDOW, DEFAULT_OVERLAP);
            prop_assert_eq!(ranges.first().map(|r| r.start), Some(0));
            prop_assert_eq!(ranges.last().map(|r| r.end), Some(len));
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].start + DEFAULT_WINDOW - DEFAULT_OVERLAP);
            }
        }
    }
}

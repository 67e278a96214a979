//! Positional chunk splitting for translation requests.
//!
//! Boundaries are purely character-count based, not sentence- or
//! paragraph-aware: a chunk may end mid-word. Translated chunks are later
//! reassembled by plain in-order concatenation, so the splitter must cover
//! the input exactly once with no gaps or overlap.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Every chunk except possibly the last has exactly `max_chars` characters;
/// the last has between 1 and `max_chars`. Empty input yields no chunks.
/// Counting is per `char`, so a chunk boundary never lands inside a UTF-8
/// code point.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    debug_assert!(max_chars > 0, "chunk size must be positive");

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

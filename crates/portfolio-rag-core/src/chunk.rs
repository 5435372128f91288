//! Sentence-boundary text chunker.
//!
//! Splits document text into chunks of roughly `max_chars` characters
//! without ever cutting a sentence in half.
//!
//! # Algorithm
//!
//! 1. Split the text into sentences. A sentence ends at `.`, `?`, or `!`
//!    when that mark is followed by whitespace; the whitespace run is the
//!    delimiter and is dropped.
//! 2. Greedily accumulate sentences into a running chunk. Before appending
//!    the next sentence, check whether `current + sentence` would exceed
//!    `max_chars`. If it would, emit the current chunk (trimmed) and start
//!    a new one with that sentence; otherwise append it after a space.
//! 3. Emit the final non-empty chunk.
//!
//! `max_chars` is a soft target: a single sentence longer than the budget
//! is emitted whole as its own chunk. Lengths are counted in Unicode
//! scalar values, not bytes.
//!
//! # Example
//!
//! ```rust
//! use portfolio_rag_core::chunk::split_text;
//!
//! let chunks = split_text("One. Two. Three.", 8);
//! assert_eq!(chunks, vec!["One.", "Two.", "Three."]);
//! ```

use crate::models::{Chunk, SourceDocument};

/// Default chunk budget in characters.
pub const DEFAULT_MAX_CHARS: usize = 200;

/// Split `text` into sentences on `[.?!]` followed by whitespace.
///
/// Sentences keep their terminal punctuation. Empty pieces (e.g. from
/// trailing whitespace) are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;
    let mut in_delimiter = false;

    for (i, c) in text.char_indices() {
        if in_delimiter {
            if c.is_whitespace() {
                prev = Some(c);
                continue;
            }
            in_delimiter = false;
            start = i;
        } else if c.is_whitespace() && matches!(prev, Some('.' | '?' | '!')) {
            push_sentence(&mut sentences, &text[start..i]);
            in_delimiter = true;
        }
        prev = Some(c);
    }

    if !in_delimiter {
        push_sentence(&mut sentences, &text[start..]);
    }

    sentences
}

fn push_sentence<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    if !piece.trim().is_empty() {
        out.push(piece);
    }
}

/// Greedily pack sentences into chunks of about `max_chars` characters.
///
/// # Guarantees
///
/// - Empty or whitespace-only input yields no chunks.
/// - Chunk boundaries only fall between sentences.
/// - Output order follows the source text.
/// - Every chunk is trimmed and non-empty.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();

        if current_chars + sentence_chars > max_chars {
            flush(&mut chunks, &current);
            current.clear();
            current.push_str(sentence);
            current_chars = sentence_chars;
        } else {
            current.push(' ');
            current.push_str(sentence);
            current_chars += 1 + sentence_chars;
        }
    }

    flush(&mut chunks, &current);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Chunk a whole [`SourceDocument`], tagging each piece with its source id
/// and position.
pub fn chunk_document(doc: &SourceDocument, max_chars: usize) -> Vec<Chunk> {
    split_text(&doc.text, max_chars)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            source_id: doc.id.clone(),
            index,
            text,
        })
        .collect()
}

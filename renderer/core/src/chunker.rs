//! Word-Safe Chunking
//!
//! Splits a pending text delta into ordered chunks sized near a target
//! length without ever cutting inside a word. Chunk boundaries land on
//! whitespace (space or newline), so a partially revealed message never
//! shows half a word.

use serde::{Deserialize, Serialize};

/// A word-safe contiguous piece of a pending delta
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk content
    pub text: String,
    /// Position in the delta's chunk sequence, starting at 0
    pub index: usize,
}

/// Split `text` into word-safe chunks of roughly `target_size` characters.
///
/// A chunk closes at the first whitespace character once its running length
/// (in `char`s, not bytes) has reached `target_size`; the whitespace itself
/// belongs to the closing chunk. A run of non-whitespace longer than the
/// target is emitted as one oversized chunk rather than split mid-word.
/// Concatenating the result in order reconstructs `text` exactly.
///
/// `target_size` is clamped to at least 1. Empty input yields no chunks.
///
/// ```
/// use flowmark_core::chunker::chunk;
///
/// let chunks = chunk("The quick brown fox", 5);
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["The quick ", "brown ", "fox"]);
/// ```
pub fn chunk(text: &str, target_size: usize) -> Vec<Chunk> {
    let target = target_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;

    for ch in text.chars() {
        current.push(ch);
        len += 1;
        if len >= target && is_boundary(ch) {
            chunks.push(Chunk {
                text: std::mem::take(&mut current),
                index: chunks.len(),
            });
            len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            text: current,
            index: chunks.len(),
        });
    }

    chunks
}

/// Whitespace characters a chunk may close on
fn is_boundary(ch: char) -> bool {
    ch == ' ' || ch == '\n'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_boundaries_land_after_whitespace() {
        let chunks = chunk("The quick brown fox", 5);
        assert_eq!(texts(&chunks), ["The quick ", "brown ", "fox"]);
    }

    #[test]
    fn test_reconstruction_is_exact() {
        let inputs = [
            "The quick brown fox jumps over the lazy dog",
            "one\ntwo\nthree four five",
            "  leading and   irregular   spacing ",
            "no-spaces-at-all-in-this-one",
            "tail",
        ];
        for input in inputs {
            for size in 1..=12 {
                let joined: String = chunk(input, size)
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect();
                assert_eq!(joined, input, "size {size} broke reconstruction");
            }
        }
    }

    #[test]
    fn test_no_chunk_starts_mid_word() {
        let input = "streaming markdown arrives one delta at a time";
        for size in 2..=15 {
            let chunks = chunk(input, size);
            for pair in chunks.windows(2) {
                let prev_last = pair[0].text.chars().last().unwrap();
                assert!(
                    is_boundary(prev_last),
                    "size {size}: boundary after {:?} splits a word",
                    pair[0].text
                );
            }
        }
    }

    #[test]
    fn test_indices_are_sequential() {
        let chunks = chunk("a b c d e f g h", 2);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
        }
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(chunk("", 10).is_empty());
    }

    #[test]
    fn test_oversized_token_is_not_split() {
        let chunks = chunk("supercalifragilistic", 5);
        assert_eq!(texts(&chunks), ["supercalifragilistic"]);

        let chunks = chunk("tiny supercalifragilistic end", 4);
        assert_eq!(texts(&chunks), ["tiny ", "supercalifragilistic ", "end"]);
    }

    #[test]
    fn test_newline_is_a_boundary() {
        let chunks = chunk("first line\nsecond line", 8);
        assert_eq!(texts(&chunks), ["first line\n", "second line"]);
    }

    #[test]
    fn test_target_size_one() {
        let chunks = chunk("a b", 1);
        assert_eq!(texts(&chunks), ["a ", "b"]);
    }

    #[test]
    fn test_zero_target_is_clamped() {
        let chunks = chunk("a b", 0);
        assert_eq!(texts(&chunks), ["a ", "b"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // Each kana is 3 bytes; target counts characters.
        let chunks = chunk("こんにちは 世界 です", 5);
        assert_eq!(texts(&chunks), ["こんにちは ", "世界 です"]);
    }
}

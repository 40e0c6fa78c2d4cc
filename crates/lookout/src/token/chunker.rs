//! Token-window chunking: split text into segments of at most `max_tokens`
//! tokens each.
//!
//! The full text is encoded once, the token sequence is walked in
//! non-overlapping windows, and each window is decoded back to text. The
//! segments concatenate to the original token stream; the decoded text is
//! not guaranteed byte-identical to the input (an accepted lossy boundary
//! of BPE decoding).

use crate::token::tokenizer::Tokenizer;

/// Split `text` into segments of at most `max_tokens` tokens, in order.
///
/// The last segment may be shorter. Empty text yields an empty vector.
/// `max_tokens == 0` is a contract violation and returns an error rather
/// than looping.
pub fn chunk(
    tokenizer: &dyn Tokenizer,
    text: &str,
    max_tokens: usize,
) -> Result<Vec<String>, String> {
    if max_tokens == 0 {
        return Err("chunk: max_tokens must be > 0".to_string());
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let tokens = tokenizer.encode(text);
    let mut segments = Vec::with_capacity(tokens.len().div_ceil(max_tokens));
    let mut start = 0;
    while start < tokens.len() {
        let mut end = (start + max_tokens).min(tokens.len());
        loop {
            match tokenizer.decode(&tokens[start..end]) {
                Ok(segment) => {
                    segments.push(segment);
                    break;
                }
                // A window boundary can land inside a multi-byte character;
                // retreat one token so the segment decodes as valid UTF-8.
                // The dropped token starts the next window.
                Err(_) if end > start + 1 => end -= 1,
                Err(e) => return Err(e),
            }
        }
        start = end;
    }
    Ok(segments)
}

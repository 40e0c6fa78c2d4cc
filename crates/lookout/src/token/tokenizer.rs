//! Tokenizer adapter: exact token counting and text/token conversion.
//!
//! Wraps the BPE tokenizer behind a small trait so the chunker, budget
//! checks, and tests are not tied to one vocabulary. `len(encode(text))`
//! is the authoritative token count everywhere in the crate.

/// Pluggable tokenizer for counting and splitting text by token.
///
/// The round trip is stable for counting purposes only:
/// `decode(encode(text))` is not guaranteed to be byte-identical to
/// `text` for every input, and callers must not rely on it being so.
pub trait Tokenizer: Send + Sync {
    /// Convert text to a token id sequence.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Convert a token id sequence back to text.
    fn decode(&self, tokens: &[u32]) -> Result<String, String>;

    /// The authoritative token count for `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Identifier for logging.
    fn name(&self) -> &str;
}

/// Production tokenizer backed by the `cl100k_base` BPE vocabulary.
///
/// The vocabulary ships embedded in `tiktoken-rs`, so construction needs
/// no network or filesystem access, only a one-time decompression cost.
pub struct Cl100kTokenizer {
    bpe: tiktoken_rs::CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, String> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| format!("failed to load cl100k tokenizer: {e}"))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        // Ordinary encoding: input is page text, never special tokens.
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| format!("failed to decode tokens: {e}"))
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

//! Recursive, query-anchored summarization within a fixed token budget.
//!
//! Guarantees the model is never asked to summarize more than it can hold
//! in context, regardless of input length. Text that fits the working
//! budget is summarized in a single generation call; oversized text is
//! split into token windows, each window summarized recursively, and the
//! joined summaries summarized again — the join pass is the base case
//! once the combined summaries fit.
//!
//! Two guards bound the recursion: a depth cap, and a monotonic-shrink
//! check that fails closed (returning budget-truncated partial summaries)
//! if a pass does not reduce total token volume.

use crate::Message;
use crate::agent::prompt::today;
use crate::api::{GenerationFuture, GenerationRequest, ModelRuntime};
use crate::context::budget::TokenBudget;
use crate::token::chunker::chunk;
use crate::token::tokenizer::Tokenizer;
use crate::ui::{NoopStatus, StatusSink};
use tracing::{debug, warn};

/// System prompt for each summarization call. Instructs the model to
/// extract query-relevant content, cite the source where possible, and
/// treat an empty answer as valid.
const EXTRACTION_PROMPT: &str = "\
You are a helpful assistant that given a QUERY and a CONTEXT, extracts relevant \
information from the CONTEXT that may help answer the QUERY. \
Prefer citing exactly the CONTEXT if you can. Pay attention to dates. \
If the CONTEXT contains nothing relevant to the QUERY, reply with nothing at all \
— an empty answer is valid. \
*IMPORTANT* Today's date is: ";

/// Configuration for the recursive summarizer.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Token budget derived from the model's context window.
    pub budget: TokenBudget,
    /// Maximum recursion depth before failing closed.
    pub max_depth: usize,
    /// Response token cap for each summarization call.
    pub max_summary_tokens: u32,
    /// Sampling temperature for summarization (low: extraction, not prose).
    pub temperature: f32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            budget: TokenBudget::default(),
            max_depth: 8,
            max_summary_tokens: 512,
            temperature: 0.3,
        }
    }
}

/// Collapses text of any length into a query-anchored summary that fits
/// the working token budget.
///
/// # Example
///
/// ```ignore
/// let summarizer = RecursiveSummarizer::new(&model, &tokenizer)
///     .with_status(&status);
/// let summary = summarizer.summarize(&page_markdown, "f1 race results").await?;
/// ```
pub struct RecursiveSummarizer<'a> {
    model: &'a dyn ModelRuntime,
    tokenizer: &'a dyn Tokenizer,
    status: &'a dyn StatusSink,
    config: SummarizerConfig,
}

impl<'a> RecursiveSummarizer<'a> {
    pub fn new(model: &'a dyn ModelRuntime, tokenizer: &'a dyn Tokenizer) -> Self {
        Self {
            model,
            tokenizer,
            status: &NoopStatus,
            config: SummarizerConfig::default(),
        }
    }

    /// Attach a status sink for progress reporting.
    pub fn with_status(mut self, status: &'a dyn StatusSink) -> Self {
        self.status = status;
        self
    }

    /// Override the summarizer configuration.
    pub fn with_config(mut self, config: SummarizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Summarize `text` with respect to `query`, within the working budget.
    ///
    /// The result re-tokenizes to at most the working budget. An empty
    /// result means the model found nothing relevant.
    pub async fn summarize(&self, text: &str, query: &str) -> Result<String, String> {
        // Strip embedded line breaks before the first token count; every
        // count below assumes normalized text.
        let normalized = normalize_inline(text);
        self.summarize_at_depth(normalized, query, 0).await
    }

    /// One recursion step. Boxed because the future is recursive.
    fn summarize_at_depth<'s>(
        &'s self,
        text: String,
        query: &'s str,
        depth: usize,
    ) -> GenerationFuture<'s> {
        Box::pin(async move {
            if text.is_empty() {
                return Ok(String::new());
            }

            let working = self.config.budget.working();
            let total = self.tokenizer.count(&text);

            if total <= working {
                return self.summarize_once(&text, query).await;
            }

            if depth >= self.config.max_depth {
                warn!(
                    "summarization depth cap ({}) reached with {total} tokens left; \
                     truncating to budget",
                    self.config.max_depth
                );
                return truncate_to_tokens(self.tokenizer, &text, working);
            }

            let segments = chunk(self.tokenizer, &text, working)?;
            debug!(
                "depth {depth}: splitting {total} tokens into {} segments of <= {working}",
                segments.len()
            );
            self.status
                .set_status(&format!("Condensing {} sections", segments.len()));

            let mut parts = Vec::with_capacity(segments.len());
            for segment in segments {
                let part = self.summarize_at_depth(segment, query, depth + 1).await?;
                if !part.is_empty() {
                    parts.push(part);
                }
            }
            let joined = parts.join("\n");
            if joined.is_empty() {
                return Ok(String::new());
            }

            // Shrink guard: a pass that did not reduce token volume would
            // recurse forever. Fail closed with budget-truncated partials.
            let joined_total = self.tokenizer.count(&joined);
            if joined_total >= total {
                warn!(
                    "summarization pass did not shrink ({total} -> {joined_total} tokens); \
                     truncating to budget"
                );
                return truncate_to_tokens(self.tokenizer, &joined, working);
            }

            self.summarize_at_depth(joined, query, depth + 1).await
        })
    }

    /// Single summarization call for text known to fit the budget.
    async fn summarize_once(&self, text: &str, query: &str) -> Result<String, String> {
        let request = GenerationRequest::new(vec![
            Message::system(format!("{EXTRACTION_PROMPT}{}", today())),
            Message::user(format!(
                "QUERY: {query}\nCONTEXT: {text}\nExtract relevant information."
            )),
        ])
        .with_max_tokens(self.config.max_summary_tokens)
        .with_temperature(self.config.temperature);

        let output = self.model.generate(request).await?;
        Ok(output.trim().to_string())
    }
}

/// Strip embedded line breaks, joining lines with single spaces.
pub(crate) fn normalize_inline(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hard-truncate `text` to at most `max_tokens` tokens.
fn truncate_to_tokens(
    tokenizer: &dyn Tokenizer,
    text: &str,
    max_tokens: usize,
) -> Result<String, String> {
    Ok(chunk(tokenizer, text, max_tokens)?
        .into_iter()
        .next()
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SnapshotHandler;
    use crate::token::tokenizer::Cl100kTokenizer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Model stub returning a fixed string and counting calls.
    struct FixedModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ModelRuntime for FixedModel {
        fn generate(&self, _request: GenerationRequest) -> GenerationFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            Box::pin(async move { Ok(reply) })
        }

        fn generate_stream<'b>(
            &'b self,
            request: GenerationRequest,
            _on_snapshot: SnapshotHandler<'b>,
        ) -> GenerationFuture<'b> {
            self.generate(request)
        }
    }

    fn tiny_config(window: usize, reserve: usize) -> SummarizerConfig {
        SummarizerConfig {
            budget: TokenBudget::new(window, reserve).unwrap(),
            ..SummarizerConfig::default()
        }
    }

    #[tokio::test]
    async fn under_budget_issues_exactly_one_call() {
        let model = FixedModel::new("a short summary");
        let tok = Cl100kTokenizer::new().unwrap();
        let summarizer =
            RecursiveSummarizer::new(&model, &tok).with_config(tiny_config(256, 32));

        let result = summarizer.summarize("a few words of context", "q").await.unwrap();
        assert_eq!(result, "a short summary");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn over_budget_issues_one_call_per_chunk_plus_join() {
        let model = FixedModel::new("brief");
        let tok = Cl100kTokenizer::new().unwrap();
        let config = tiny_config(64, 16); // working budget: 48
        let working = config.budget.working();
        let summarizer = RecursiveSummarizer::new(&model, &tok).with_config(config);

        let text = "the quick brown fox jumps over the lazy dog ".repeat(30);
        let normalized = normalize_inline(&text);
        let chunks = chunk(&tok, &normalized, working).unwrap().len();
        assert!(chunks > 1, "test input must exceed the working budget");

        let result = summarizer.summarize(&text, "q").await.unwrap();
        assert_eq!(result, "brief");
        // One base-level call per chunk, plus one call for the join pass.
        assert_eq!(model.call_count(), chunks + 1);
    }

    #[tokio::test]
    async fn empty_text_makes_no_calls() {
        let model = FixedModel::new("unused");
        let tok = Cl100kTokenizer::new().unwrap();
        let summarizer = RecursiveSummarizer::new(&model, &tok);

        assert_eq!(summarizer.summarize("", "q").await.unwrap(), "");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn all_empty_summaries_collapse_to_empty() {
        let model = FixedModel::new("");
        let tok = Cl100kTokenizer::new().unwrap();
        let summarizer =
            RecursiveSummarizer::new(&model, &tok).with_config(tiny_config(64, 16));

        let text = "nothing relevant here at all ".repeat(40);
        assert_eq!(summarizer.summarize(&text, "q").await.unwrap(), "");
    }

    #[tokio::test]
    async fn non_shrinking_summaries_fail_closed_within_budget() {
        // A model whose "summaries" are as long as the working budget
        // would recurse forever without the shrink guard.
        let model = FixedModel::new(&"padding words forever ".repeat(20));
        let tok = Cl100kTokenizer::new().unwrap();
        let config = tiny_config(64, 16);
        let working = config.budget.working();
        let summarizer = RecursiveSummarizer::new(&model, &tok).with_config(config);

        let text = "some page text to be split into pieces ".repeat(20);
        let result = summarizer.summarize(&text, "q").await.unwrap();
        assert!(tok.count(&result) <= working, "result must fit the budget");
    }

    #[test]
    fn normalize_strips_line_breaks() {
        assert_eq!(
            normalize_inline("line one\n\n  line two\r\nline three\n"),
            "line one line two line three"
        );
        assert_eq!(normalize_inline(""), "");
        assert_eq!(normalize_inline("\n\n\n"), "");
    }
}

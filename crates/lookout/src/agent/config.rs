//! Configuration for the [`Orchestrator`](super::orchestrator::Orchestrator).
//!
//! Defaults suit a small local model behind an OpenAI-compatible server;
//! override specific knobs through the builder methods.
//!
//! ```ignore
//! let config = OrchestratorConfig::default()
//!     .with_top_links(3)
//!     .with_budget(TokenBudget::new(32_768, 2048)?)
//!     .with_max_answer_tokens(2048);
//! ```

use crate::context::budget::TokenBudget;
use crate::context::summarizer::SummarizerConfig;

/// How many search results are read per tool call, in provider order.
pub const DEFAULT_TOP_LINKS: usize = 5;

/// Per-turn configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Number of top search results to fetch and summarize.
    pub top_links: usize,
    /// Response token cap for the tool-probe pass. The probe only needs
    /// room for a tool invocation or a short draft; its text is discarded.
    pub probe_max_tokens: u32,
    /// Response token cap for the final streamed answer.
    pub max_answer_tokens: u32,
    /// Sampling temperature for the probe and final passes.
    pub temperature: f32,
    /// Whether to condense the conversation into a search-engine query
    /// with an extra model call before retrieval. When disabled (or on
    /// failure), the latest user message anchors the summaries instead.
    pub convert_query: bool,
    /// Summarizer configuration, including the token budget.
    pub summarizer: SummarizerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            top_links: DEFAULT_TOP_LINKS,
            probe_max_tokens: 512,
            max_answer_tokens: 1024,
            temperature: 0.7,
            convert_query: true,
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Set the number of search results to read.
    pub fn with_top_links(mut self, top_links: usize) -> Self {
        self.top_links = top_links;
        self
    }

    /// Set the token budget used for summarization.
    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.summarizer.budget = budget;
        self
    }

    /// Set the response token cap for the final answer.
    pub fn with_max_answer_tokens(mut self, max_tokens: u32) -> Self {
        self.max_answer_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature for probe and final passes.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enable or disable the query-conversion preprocessing call.
    pub fn with_convert_query(mut self, convert: bool) -> Self {
        self.convert_query = convert;
        self
    }

    /// Replace the full summarizer configuration.
    pub fn with_summarizer(mut self, summarizer: SummarizerConfig) -> Self {
        self.summarizer = summarizer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.top_links, DEFAULT_TOP_LINKS);
        assert!(config.convert_query);
        assert!(config.summarizer.budget.working() > 0);
    }

    #[test]
    fn with_budget_reaches_the_summarizer() {
        let budget = TokenBudget::new(1000, 100).unwrap();
        let config = OrchestratorConfig::default().with_budget(budget);
        assert_eq!(config.summarizer.budget.working(), 900);
    }

    #[test]
    fn builders_chain() {
        let config = OrchestratorConfig::default()
            .with_top_links(3)
            .with_max_answer_tokens(2048)
            .with_temperature(0.2)
            .with_convert_query(false);
        assert_eq!(config.top_links, 3);
        assert_eq!(config.max_answer_tokens, 2048);
        assert!(!config.convert_query);
    }
}

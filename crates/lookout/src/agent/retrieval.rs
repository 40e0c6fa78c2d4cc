//! Retrieval pipeline: turn a web-search tool call into an ordered bundle
//! of page summaries.
//!
//! Search once, then walk the top results strictly sequentially: fetch a
//! page, summarize it against the anchor query, append the summary. A
//! page that fails to fetch or summarize is logged and skipped — a single
//! bad page never aborts the pipeline, and no placeholder takes its slot.
//! Only a search-provider failure escalates to the caller.

use crate::agent::orchestrator::TURN_CANCELLED;
use crate::context::summarizer::RecursiveSummarizer;
use crate::tools::spec::WebSearchCall;
use crate::ui::{NoopStatus, StatusSink};
use crate::web::{FetchProvider, SearchProvider};
use tracing::{debug, warn};

/// Sequential search → fetch → summarize pipeline.
///
/// ```ignore
/// let pipeline = RetrievalPipeline::new(&search, &fetch, &summarizer)
///     .with_status(&status)
///     .with_top_links(5);
/// let bundle = pipeline.retrieve(&call, "f1 race results").await?;
/// ```
pub struct RetrievalPipeline<'a> {
    search: &'a dyn SearchProvider,
    fetch: &'a dyn FetchProvider,
    summarizer: &'a RecursiveSummarizer<'a>,
    status: &'a dyn StatusSink,
    top_links: usize,
    stop_signal: Option<&'a (dyn Fn() -> bool + Send + Sync)>,
}

impl<'a> RetrievalPipeline<'a> {
    pub fn new(
        search: &'a dyn SearchProvider,
        fetch: &'a dyn FetchProvider,
        summarizer: &'a RecursiveSummarizer<'a>,
    ) -> Self {
        Self {
            search,
            fetch,
            summarizer,
            status: &NoopStatus,
            top_links: crate::agent::config::DEFAULT_TOP_LINKS,
            stop_signal: None,
        }
    }

    /// Attach a status sink for progress reporting.
    pub fn with_status(mut self, status: &'a dyn StatusSink) -> Self {
        self.status = status;
        self
    }

    /// Override how many top results are read.
    pub fn with_top_links(mut self, top_links: usize) -> Self {
        self.top_links = top_links;
        self
    }

    /// Attach a stop signal, checked between pages. A stopped pipeline
    /// returns [`TURN_CANCELLED`] and its partial bundle is discarded.
    pub fn with_stop_signal(mut self, signal: &'a (dyn Fn() -> bool + Send + Sync)) -> Self {
        self.stop_signal = Some(signal);
        self
    }

    fn stopped(&self) -> bool {
        self.stop_signal.is_some_and(|stop| stop())
    }

    /// Execute the tool call and return the ordered context bundle.
    ///
    /// An empty bundle is a valid outcome — no results, or every page
    /// failed — and means "no external context available".
    pub async fn retrieve(
        &self,
        call: &WebSearchCall,
        anchor_query: &str,
    ) -> Result<Vec<String>, String> {
        let query = call.query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.status
            .set_status(&format!("Performing web search for {query}"));
        let results = self.search.search(query).await?;
        debug!(
            "search returned {} results; reading top {}",
            results.len(),
            self.top_links.min(results.len())
        );

        let mut bundle = Vec::new();
        for result in results.into_iter().take(self.top_links) {
            if self.stopped() {
                return Err(TURN_CANCELLED.to_string());
            }

            self.status.set_status(&format!("Reading {}", result.url));
            let markdown = match self.fetch.fetch_markdown(&result.url).await {
                Ok(markdown) => markdown,
                Err(e) => {
                    warn!("skipping {}: {e}", result.url);
                    continue;
                }
            };

            self.status
                .set_status(&format!("Summarizing {}", result.url));
            match self.summarizer.summarize(&markdown, anchor_query).await {
                Ok(summary) => bundle.push(summary),
                Err(e) => warn!("failed to summarize {}: {e}", result.url),
            }
        }

        Ok(bundle)
    }
}

//! Web access boundary: search and page-fetch provider traits plus the
//! production Serper and Firecrawl clients.
//!
//! The retrieval pipeline only ever talks to the web through
//! [`SearchProvider`] and [`FetchProvider`], so tests can stub both and
//! the provider behind each can change without touching the core.
//!
//! - [`serper`] — [`SerperClient`](serper::SerperClient), Google-backed
//!   search returning provider-ranked `(title, url)` results.
//! - [`firecrawl`] — [`FirecrawlClient`](firecrawl::FirecrawlClient),
//!   page scraping that extracts main-content Markdown.

pub mod firecrawl;
pub mod serper;

// Re-export commonly used items at the module level.
pub use firecrawl::FirecrawlClient;
pub use serper::SerperClient;

use futures::future::BoxFuture;

/// One search hit. Provider order is the only relevance signal; the core
/// performs no re-ranking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

/// Boxed future returned by [`SearchProvider::search`].
pub type SearchFuture<'a> = BoxFuture<'a, Result<Vec<SearchResult>, String>>;

/// Boxed future returned by [`FetchProvider::fetch_markdown`].
pub type FetchFuture<'a> = BoxFuture<'a, Result<String, String>>;

/// A web search engine: query string in, ordered results out.
///
/// A non-2xx response or an undecodable body is a hard error for the
/// whole call — there is no partial search result.
pub trait SearchProvider: Send + Sync {
    fn search<'a>(&'a self, query: &'a str) -> SearchFuture<'a>;
}

/// A page-content extractor: URL in, main-content Markdown out.
///
/// Failure is a hard error for that URL only; callers skip the page and
/// move on.
pub trait FetchProvider: Send + Sync {
    fn fetch_markdown<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

//! Firecrawl scrape client (api.firecrawl.dev).
//!
//! Requests main-content Markdown for a URL. A `success=false` response
//! or a response without Markdown is a hard error for that URL — the
//! retrieval pipeline skips the page and moves on.

use crate::web::{FetchFuture, FetchProvider};
use serde::{Deserialize, Serialize};
use tracing::debug;

const FIRECRAWL_URL: &str = "https://api.firecrawl.dev/v1/scrape";

/// Serve cached page snapshots up to this old (milliseconds); keeps
/// repeat reads of popular pages off the crawler.
const MAX_CACHE_AGE_MS: u64 = 14_400_000;

/// Client for the Firecrawl page-extraction API.
pub struct FirecrawlClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl FirecrawlClient {
    /// Create a client with the given API bearer token.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("lookout/0.2")
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: FIRECRAWL_URL.to_string(),
        })
    }

    /// Create a client from the `FIRECRAWL_API_KEY` environment variable.
    /// `FIRECRAWL_ENDPOINT` overrides the endpoint (tests, proxies).
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("FIRECRAWL_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "FIRECRAWL_API_KEY is not set".to_string())?;
        let mut client = Self::new(api_key)?;
        if let Ok(endpoint) = std::env::var("FIRECRAWL_ENDPOINT")
            && !endpoint.trim().is_empty()
        {
            client.endpoint = endpoint.trim().to_string();
        }
        Ok(client)
    }

    async fn fetch_inner(&self, url: &str) -> Result<String, String> {
        debug!("scrape request: {url}");
        let body = ScrapeRequest {
            url,
            formats: &["markdown"],
            only_main_content: true,
            parse_pdf: true,
            max_age: MAX_CACHE_AGE_MS,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("scrape request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("scrape HTTP {status} for {url}"));
        }

        let parsed: ScrapeResponse = resp
            .json()
            .await
            .map_err(|e| format!("failed to decode scrape response: {e}"))?;

        match parsed {
            ScrapeResponse {
                success: true,
                data: Some(ScrapeData {
                    markdown: Some(markdown),
                }),
            } => {
                debug!("scraped {} bytes of markdown from {url}", markdown.len());
                Ok(markdown)
            }
            _ => Err(format!("scrape returned no markdown for {url}")),
        }
    }
}

impl FetchProvider for FirecrawlClient {
    fn fetch_markdown<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(self.fetch_inner(url))
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: &'a [&'a str],
    only_main_content: bool,
    #[serde(rename = "parsePDF")]
    parse_pdf: bool,
    max_age: u64,
}

#[derive(Deserialize, Debug)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
}

#[derive(Deserialize, Debug)]
struct ScrapeData {
    markdown: Option<String>,
}

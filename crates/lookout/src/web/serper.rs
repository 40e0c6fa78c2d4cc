//! Serper search client (google.serper.dev).
//!
//! Sends `{"q": query}` with an `X-API-KEY` header and maps the
//! `organic` result list to [`SearchResult`]s in provider order.

use crate::web::{SearchFuture, SearchProvider, SearchResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SERPER_URL: &str = "https://google.serper.dev/search";

/// Per-request timeout. Search is the one provider call the turn cannot
/// route around by skipping, so it gets an explicit cap.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Serper web-search API.
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl SerperClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("lookout/0.2")
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: SERPER_URL.to_string(),
        })
    }

    /// Create a client from the `SERPER_API_KEY` environment variable.
    /// `SERPER_ENDPOINT` overrides the endpoint (tests, proxies).
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("SERPER_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "SERPER_API_KEY is not set".to_string())?;
        let mut client = Self::new(api_key)?;
        if let Ok(endpoint) = std::env::var("SERPER_ENDPOINT")
            && !endpoint.trim().is_empty()
        {
            client.endpoint = endpoint.trim().to_string();
        }
        Ok(client)
    }

    async fn search_inner(&self, query: &str) -> Result<Vec<SearchResult>, String> {
        debug!("search request: {query}");
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(SEARCH_TIMEOUT)
            .header("X-API-KEY", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&SearchRequest { q: query })
            .send()
            .await
            .map_err(|e| format!("search request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("search HTTP {status}"));
        }

        let parsed: SerperResponse = resp
            .json()
            .await
            .map_err(|e| format!("failed to decode search response: {e}"))?;
        debug!("search returned {} organic results", parsed.organic.len());

        Ok(parsed
            .organic
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.link,
            })
            .collect())
    }
}

impl SearchProvider for SerperClient {
    fn search<'a>(&'a self, query: &'a str) -> SearchFuture<'a> {
        Box::pin(self.search_inner(query))
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct SearchRequest<'a> {
    q: &'a str,
}

#[derive(Deserialize, Debug)]
struct SerperResponse {
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize, Debug)]
struct OrganicResult {
    title: String,
    link: String,
}

//! Async HTTP client for an OpenAI-compatible local model runtime.
//!
//! Works against any server exposing `POST /v1/chat/completions`
//! (llama.cpp `llama-server`, Ollama, LM Studio, vLLM). The client owns
//! the model-session gate: the underlying model context is a shared,
//! non-reentrant resource, so every generation call — probe, per-page
//! summarization, final answer — acquires an async mutex before touching
//! the wire.
//!
//! No overall request timeout is set: local generation time is unbounded
//! (a cold model load alone can take minutes). Only connection
//! establishment is capped.

use crate::api::retry::RetryConfig;
use crate::api::streaming::{SseAssembler, StreamEvent, collect_text};
use crate::api::{GenerationFuture, GenerationRequest, ModelRuntime, SnapshotHandler, UsageInfo};
use crate::{Message, ToolDef};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Client for a locally served chat-completions endpoint.
///
/// ```ignore
/// let model = LocalModelClient::new("http://127.0.0.1:8080", "qwen2.5:3b-instruct")?
///     .with_retry(RetryConfig::with_retries(2));
/// ```
pub struct LocalModelClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
    /// Serializes generation calls against the single model session.
    gate: tokio::sync::Mutex<()>,
}

impl LocalModelClient {
    /// Create a client for the runtime at `base_url` serving `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("lookout/0.2")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            model: model.into(),
            api_key: None,
            retry: RetryConfig::default(),
            gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Attach a bearer token for runtimes that require one.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the retry policy for non-streaming generation calls.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The configured runtime base URL (trailing slashes stripped).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn request_builder(&self) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.endpoint());
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder
    }

    /// One non-streaming completion attempt.
    async fn chat_once(&self, request: &GenerationRequest) -> Result<String, String> {
        let body = ChatRequestBody::from_request(&self.model, request, false);
        debug!(
            "model request: model={}, messages={}, tools={}, max_tokens={}",
            self.model,
            request.messages.len(),
            request.tools.as_ref().map_or(0, |t| t.len()),
            request.max_tokens,
        );
        trace!(
            "request payload size: {} bytes",
            serde_json::to_string(&body).map_or(0, |s| s.len())
        );

        let start = Instant::now();
        let resp = self
            .request_builder()
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;
        debug!(
            "model response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("model runtime HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;
        if let Some(err) = parsed.error {
            return Err(format!("model runtime error: {}", err.message));
        }
        if let Some(ref usage) = parsed.usage {
            debug!(
                "token usage: prompt={}, completion={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
            );
        }

        let content = parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        debug!("model output: {} chars", content.len());
        Ok(content)
    }

    /// One streaming completion, reporting accumulated snapshots.
    async fn chat_stream(
        &self,
        request: &GenerationRequest,
        on_snapshot: &mut SnapshotHandler<'_>,
    ) -> Result<String, String> {
        let body = ChatRequestBody::from_request(&self.model, request, true);
        debug!(
            "streaming model request: model={}, messages={}",
            self.model,
            request.messages.len()
        );

        let mut resp = self
            .request_builder()
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("model runtime HTTP {status}: {text}"));
        }

        // Read the SSE stream incrementally via chunk() so long answers
        // don't hit a single-body read limit. Each batch of deltas
        // produces one snapshot callback carrying the full text so far.
        let mut assembler = SseAssembler::new();
        let mut events: Vec<StreamEvent> = Vec::new();
        let mut accumulated = String::new();

        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| format!("failed to read streaming chunk: {e}"))?
        {
            let before = events.len();
            assembler.push(&chunk, &mut events);
            if append_deltas(&events[before..], &mut accumulated) {
                on_snapshot(&accumulated);
            }
            if assembler.is_done() {
                break;
            }
        }

        let before = events.len();
        assembler.finish(&mut events);
        if append_deltas(&events[before..], &mut accumulated) {
            on_snapshot(&accumulated);
        }

        debug!(
            "stream completed: {} events, {} chars",
            events.len(),
            accumulated.len()
        );
        debug_assert_eq!(accumulated, collect_text(&events));
        Ok(accumulated)
    }
}

/// Append any text deltas in `events` to `accumulated`; true if it grew.
fn append_deltas(events: &[StreamEvent], accumulated: &mut String) -> bool {
    let mut grew = false;
    for event in events {
        if let StreamEvent::TextDelta(delta) = event {
            accumulated.push_str(delta);
            grew = true;
        }
    }
    grew
}

impl ModelRuntime for LocalModelClient {
    fn generate(&self, request: GenerationRequest) -> GenerationFuture<'_> {
        Box::pin(async move {
            let _session = self.gate.lock().await;
            let mut attempt = 0;
            loop {
                match self.chat_once(&request).await {
                    Ok(text) => return Ok(text),
                    Err(e) if self.retry.should_retry(&e, attempt) => {
                        let delay = self.retry.delay_for_attempt(attempt);
                        warn!("generation attempt {attempt} failed: {e}; retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        })
    }

    fn generate_stream<'a>(
        &'a self,
        request: GenerationRequest,
        mut on_snapshot: SnapshotHandler<'a>,
    ) -> GenerationFuture<'a> {
        // Streaming calls are not retried: a mid-stream failure after
        // snapshots were already displayed cannot be replayed cleanly.
        Box::pin(async move {
            let _session = self.gate.lock().await;
            self.chat_stream(&request, &mut on_snapshot).await
        })
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDef]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl<'a> ChatRequestBody<'a> {
    fn from_request(model: &'a str, request: &'a GenerationRequest, stream: bool) -> Self {
        Self {
            model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref(),
            stream,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_stripped() {
        let client = LocalModelClient::new("http://127.0.0.1:8080/", "m").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8080/v1/chat/completions");
    }

    #[test]
    fn request_body_skips_absent_fields() {
        let request = GenerationRequest::new(vec![Message::user("hi")]);
        let body = ChatRequestBody::from_request("m", &request, false);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn request_body_includes_stream_and_tools() {
        let request = GenerationRequest::new(vec![Message::user("hi")])
            .with_tools(vec![crate::tools::spec::web_search_tool_def()]);
        let body = ChatRequestBody::from_request("m", &request, true);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["tools"][0]["function"]["name"], "search_web");
    }

    #[test]
    fn append_deltas_reports_growth() {
        let mut acc = String::new();
        assert!(!append_deltas(&[StreamEvent::Done], &mut acc));
        assert!(append_deltas(
            &[StreamEvent::TextDelta("hi".into())],
            &mut acc
        ));
        assert_eq!(acc, "hi");
    }
}

//! Model runtime boundary: the [`ModelRuntime`] trait, the
//! OpenAI-compatible [`LocalModelClient`](client::LocalModelClient), SSE
//! streaming, and retry.
//!
//! The rest of the crate only ever talks to the model through
//! [`ModelRuntime`]; the concrete client is one implementation of it.
//! Modules:
//!
//! - [`client`] — [`LocalModelClient`](client::LocalModelClient), a
//!   reqwest client for a locally served chat-completions endpoint
//!   (llama.cpp, Ollama, LM Studio). Serializes generation calls: the
//!   model session is a shared, non-reentrant resource.
//! - [`streaming`] — SSE parser producing
//!   [`StreamEvent`](streaming::StreamEvent) values, plus assembly
//!   helpers.
//! - [`retry`] — transient error detection (429, 5xx, network resets)
//!   with exponential backoff. Never retries 400/401 errors.

pub mod client;
pub mod retry;
pub mod streaming;

// Re-export commonly used items at the module level.
pub use client::LocalModelClient;
pub use retry::RetryConfig;

use crate::{Message, ToolDef};
use futures::future::BoxFuture;
use serde::Deserialize;

/// Boxed future returned by [`ModelRuntime`] methods.
///
/// Type alias to keep trait signatures and implementations readable.
pub type GenerationFuture<'a> = BoxFuture<'a, Result<String, String>>;

/// Callback receiving streamed answer snapshots.
///
/// Each invocation carries the **full decoded text so far** — a
/// decode-and-replace contract, not an append-only delta stream. Displays
/// must replace what they previously showed with the new snapshot.
pub type SnapshotHandler<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// One generation request: a message list plus an optional tool
/// specification and sampling parameters.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    /// Tool definitions injected into the chat template. `None` means the
    /// model cannot elect to call a tool this pass.
    pub tools: Option<Vec<ToolDef>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: None,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }

    /// Attach a tool specification to this request.
    pub fn with_tools(mut self, tools: Vec<ToolDef>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Override the response token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Token usage statistics reported by the runtime in its terminal event.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// The language-model runtime boundary.
///
/// Implementations own a single model session. Only one generation —
/// tool probe, summarization, or final answer — may be active against the
/// session at any instant; implementations serialize concurrent callers.
pub trait ModelRuntime: Send + Sync {
    /// Run a generation to completion and return the full decoded text.
    ///
    /// Used for the tool-probe pass and for summarization calls, where
    /// the output is consumed by the orchestrator rather than displayed.
    fn generate(&self, request: GenerationRequest) -> GenerationFuture<'_>;

    /// Run a generation, invoking `on_snapshot` with the full decoded
    /// text so far as batches arrive. Returns the final text.
    fn generate_stream<'a>(
        &'a self,
        request: GenerationRequest,
        on_snapshot: SnapshotHandler<'a>,
    ) -> GenerationFuture<'a>;
}

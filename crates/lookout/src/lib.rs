//! Web-augmented answer generation for local language models.
//!
//! `lookout` wraps a locally served LLM with live web access. One call to
//! [`Orchestrator::run_turn()`](agent::orchestrator::Orchestrator::run_turn)
//! drives a full turn: the model is probed with a web-search tool
//! definition, an emitted tool call is executed against a search provider
//! and a page-extraction provider, every fetched page is compressed into
//! the model's context budget by a recursive summarizer, and the final
//! answer is streamed back with the retrieved context injected into the
//! conversation.
//!
//! # Getting started
//!
//! ```ignore
//! use lookout::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let model = LocalModelClient::new("http://127.0.0.1:8080", "qwen2.5:3b-instruct")?;
//!     let search = SerperClient::from_env()?;
//!     let fetch = FirecrawlClient::from_env()?;
//!     let tokenizer = Cl100kTokenizer::new()?;
//!
//!     let answer = Orchestrator::new(&model, &search, &fetch, &tokenizer)
//!         .run_turn(
//!             vec![Message::user("Who won yesterday's race?")],
//!             true,
//!             |snapshot| print!("\r{snapshot}"),
//!         )
//!         .await?;
//!
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | [`Orchestrator`](agent::orchestrator::Orchestrator) turn loop, retrieval pipeline, query conversion, prompts |
//! | [`api`] | [`ModelRuntime`](api::ModelRuntime) boundary, OpenAI-compatible local client, SSE streaming, retry |
//! | [`context`] | [`TokenBudget`](context::TokenBudget) and the recursive summarizer |
//! | [`token`] | [`Tokenizer`](token::Tokenizer) adapter and token-window chunking |
//! | [`tools`] | Web-search tool definition and the tool-call parser |
//! | [`web`] | Search and page-fetch provider traits plus Serper/Firecrawl clients |
//! | [`ui`] | [`StatusSink`](ui::StatusSink) side-channel for transient progress text |
//!
//! # Design principles
//!
//! 1. **Context is the scarcest resource.** Page content of any length is
//!    folded into a fixed token budget before the model ever sees it; the
//!    summarizer never hands the model more than it can hold.
//!
//! 2. **Retrieval degrades, the turn survives.** A page that fails to
//!    fetch is skipped; a search provider outage means answering from the
//!    conversation alone. Only an unreachable model aborts a turn.
//!
//! 3. **One generation in flight.** The model session is a shared,
//!    non-reentrant resource; every generation call — probe, per-page
//!    summarization, final answer — is serialized through it.
//!
//! 4. **Observability over magic.** Every stage reports what it is doing
//!    through `tracing` and the injected [`StatusSink`](ui::StatusSink).

pub mod agent;
pub mod api;
pub mod context;
pub mod prelude;
pub mod token;
pub mod tools;
pub mod ui;
pub mod web;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Re-export schemars for downstream crates.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`. This is the bridge between strong Rust types
/// and the `serde_json::Value` that function-calling tool definitions
/// carry on the wire.
///
/// # Example
///
/// ```
/// use lookout::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct SearchArgs {
///     query: String,
/// }
///
/// let schema = json_schema_for::<SearchArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"query".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation.
///
/// Conversations are append-only: the orchestrator receives a message list
/// by value per turn and may append a synthetic user message carrying
/// retrieved context, but never rewrites history.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// The latest user message in a conversation, if any.
///
/// Used as the fallback anchor query when query conversion is disabled or
/// fails.
pub fn latest_user_text(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
}

// ── Tool definition wire types ─────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition sent to the model runtime (OpenAI function-calling
/// format). Local runtimes inject this into the chat template so the model
/// knows it may emit a tool invocation instead of prose.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    /// Create a function-calling tool definition.
    ///
    /// `ToolType` is always `Function` in the current wire format, so
    /// there's no reason to specify it manually.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

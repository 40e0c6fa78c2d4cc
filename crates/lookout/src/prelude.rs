//! Convenience re-exports for common `lookout` types.
//!
//! Meant to be glob-imported when embedding the orchestrator:
//!
//! ```ignore
//! use lookout::prelude::*;
//! ```
//!
//! This pulls in the types needed for the vast majority of programs: the
//! [`Orchestrator`] + config, the [`Message`] constructors, the provider
//! traits and production clients, the tokenizer, and the status sinks.
//! Specialized types (stream events, retry config, the chunker) are
//! intentionally excluded — import those from their modules directly
//! when needed.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{Message, MessageRole, ToolDef, json_schema_for, latest_user_text};

// ── Agent runtime ───────────────────────────────────────────────────
pub use crate::agent::{
    DEFAULT_TOP_LINKS, Orchestrator, OrchestratorConfig, QueryConverter, RetrievalPipeline,
    TURN_CANCELLED,
};

// ── Model runtime ───────────────────────────────────────────────────
pub use crate::api::{
    GenerationRequest, LocalModelClient, ModelRuntime, RetryConfig, SnapshotHandler,
};

// ── Context management ──────────────────────────────────────────────
pub use crate::context::{RecursiveSummarizer, SummarizerConfig, TokenBudget};

// ── Tokenization ────────────────────────────────────────────────────
pub use crate::token::{Cl100kTokenizer, Tokenizer};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{ToolInvocation, WebSearchCall, parse_tool_call, web_search_tool_def};

// ── Web providers ───────────────────────────────────────────────────
pub use crate::web::{
    FetchProvider, FirecrawlClient, SearchProvider, SearchResult, SerperClient,
};

// ── Status ──────────────────────────────────────────────────────────
pub use crate::ui::{FnStatusSink, NoopStatus, StatusSink, TracingStatus};

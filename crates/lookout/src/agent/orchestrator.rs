//! The per-turn orchestrator: probe the model for a tool call, retrieve
//! and summarize web context, stream the final answer.
//!
//! One turn moves through a fixed sequence of states:
//!
//! ```text
//! Idle → AwaitingModel(probe) → [Retrieving → Summarizing]* →
//! AwaitingModel(final) → Emitting → Idle
//! ```
//!
//! The probe pass runs to completion without streaming — its only purpose
//! is to detect a tool invocation, and its text is discarded. The final
//! pass streams decode-and-replace snapshots to the caller. Retrieval
//! failures degrade the turn to a context-free answer; only an
//! unreachable model aborts it. Status is cleared on completion and on
//! every early return.

use crate::agent::config::OrchestratorConfig;
use crate::agent::prompt::{augmented_context_message, system_instruction};
use crate::agent::query::QueryConverter;
use crate::agent::retrieval::RetrievalPipeline;
use crate::api::{GenerationRequest, ModelRuntime};
use crate::context::summarizer::RecursiveSummarizer;
use crate::token::tokenizer::Tokenizer;
use crate::tools::parser::parse_tool_call;
use crate::tools::spec::{ToolInvocation, WebSearchCall, web_search_tool_def};
use crate::ui::{NoopStatus, StatusSink};
use crate::web::{FetchProvider, SearchProvider};
use crate::{Message, latest_user_text};
use tracing::{debug, info, warn};

/// Error value returned when the caller's stop signal ends a turn early.
/// Partial retrieval state is discarded, never carried into a later turn.
pub const TURN_CANCELLED: &str = "turn cancelled";

/// Drives one end-to-end turn against the model, search, and fetch
/// boundaries.
///
/// # Lifetimes
///
/// `Orchestrator<'a>` borrows its collaborators by reference; they must
/// all outlive the `run_turn()` call. Bind everything to `let` bindings
/// *before* building the orchestrator.
///
/// ```ignore
/// let orchestrator = Orchestrator::new(&model, &search, &fetch, &tokenizer)
///     .with_status(&status)
///     .with_config(config);
/// let answer = orchestrator
///     .run_turn(conversation, true, |snapshot| display(snapshot))
///     .await?;
/// ```
pub struct Orchestrator<'a> {
    model: &'a dyn ModelRuntime,
    search: &'a dyn SearchProvider,
    fetch: &'a dyn FetchProvider,
    tokenizer: &'a dyn Tokenizer,
    status: &'a dyn StatusSink,
    config: OrchestratorConfig,
    /// Optional stop signal — checked at suspension points. If it returns
    /// `true`, the turn ends with [`TURN_CANCELLED`].
    stop_signal: Option<Box<dyn Fn() -> bool + Send + Sync + 'a>>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        model: &'a dyn ModelRuntime,
        search: &'a dyn SearchProvider,
        fetch: &'a dyn FetchProvider,
        tokenizer: &'a dyn Tokenizer,
    ) -> Self {
        Self {
            model,
            search,
            fetch,
            tokenizer,
            status: &NoopStatus,
            config: OrchestratorConfig::default(),
            stop_signal: None,
        }
    }

    /// Attach a status sink for progress reporting.
    pub fn with_status(mut self, status: &'a dyn StatusSink) -> Self {
        self.status = status;
        self
    }

    /// Override the turn configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a stop signal, polled at suspension points.
    pub fn with_stop_signal(mut self, signal: impl Fn() -> bool + Send + Sync + 'a) -> Self {
        self.stop_signal = Some(Box::new(signal));
        self
    }

    fn stopped(&self) -> bool {
        self.stop_signal.as_ref().is_some_and(|stop| stop())
    }

    fn abort(&self, error: impl Into<String>) -> Result<String, String> {
        self.status.clear_status();
        Err(error.into())
    }

    /// Run one turn over `conversation`, streaming the answer through
    /// `on_snapshot`.
    ///
    /// Each `on_snapshot` call carries the full decoded answer so far;
    /// displays replace their previous content rather than appending.
    /// Returns the final answer text.
    pub async fn run_turn(
        &self,
        conversation: Vec<Message>,
        web_search_enabled: bool,
        on_snapshot: impl FnMut(&str) + Send + 'a,
    ) -> Result<String, String> {
        if self.stopped() {
            return self.abort(TURN_CANCELLED);
        }

        let mut messages = Vec::with_capacity(conversation.len() + 2);
        messages.push(Message::system(system_instruction()));
        messages.extend(conversation);

        // ── Tool probe ──
        let mut probe_request = GenerationRequest::new(messages.clone())
            .with_max_tokens(self.config.probe_max_tokens)
            .with_temperature(self.config.temperature);
        if web_search_enabled {
            probe_request = probe_request.with_tools(vec![web_search_tool_def()]);
        }
        let probe = match self.model.generate(probe_request).await {
            Ok(text) => text,
            Err(e) => return self.abort(format!("model unavailable: {e}")),
        };

        // ── Retrieval ──
        if web_search_enabled
            && let Some(ToolInvocation::WebSearch(call)) = parse_tool_call(&probe)
        {
            info!("model requested web search: {}", call.query);
            if self.stopped() {
                return self.abort(TURN_CANCELLED);
            }
            match self.retrieve_context(&messages, &call).await {
                Ok(Some(context_message)) => messages.push(context_message),
                Ok(None) => info!("no usable web context; answering from the conversation"),
                Err(e) if e == TURN_CANCELLED => return self.abort(e),
                Err(e) => warn!("retrieval failed: {e}; answering without web context"),
            }
        } else {
            debug!("no tool call in probe output");
        }

        if self.stopped() {
            return self.abort(TURN_CANCELLED);
        }

        // ── Final pass ──
        // No tools this time: one retrieval per turn, the model must answer.
        self.status.set_status("Finalizing answer...");
        let final_request = GenerationRequest::new(messages)
            .with_max_tokens(self.config.max_answer_tokens)
            .with_temperature(self.config.temperature);
        let answer = match self
            .model
            .generate_stream(final_request, Box::new(on_snapshot))
            .await
        {
            Ok(answer) => answer,
            Err(e) => return self.abort(format!("model unavailable: {e}")),
        };

        self.status.clear_status();
        Ok(answer)
    }

    /// Run the retrieval pipeline for a tool call; `Ok(Some)` carries the
    /// synthetic user message to append before the final pass.
    async fn retrieve_context(
        &self,
        messages: &[Message],
        call: &WebSearchCall,
    ) -> Result<Option<Message>, String> {
        let anchor = self.anchor_query(messages, call).await;
        debug!("anchor query: {anchor}");

        let summarizer = RecursiveSummarizer::new(self.model, self.tokenizer)
            .with_status(self.status)
            .with_config(self.config.summarizer.clone());
        let mut pipeline = RetrievalPipeline::new(self.search, self.fetch, &summarizer)
            .with_status(self.status)
            .with_top_links(self.config.top_links);
        if let Some(ref stop) = self.stop_signal {
            pipeline = pipeline.with_stop_signal(&**stop);
        }

        let bundle = pipeline.retrieve(call, &anchor).await?;
        if bundle.iter().all(|s| s.is_empty()) {
            return Ok(None);
        }
        info!("retrieved {} context snippet(s)", bundle.len());
        Ok(Some(Message::user(augmented_context_message(
            &anchor, &bundle,
        ))))
    }

    /// The query that anchors summarization and the context message:
    /// the condensed conversation when query conversion is enabled, else
    /// the latest user message, else the tool call's own query.
    async fn anchor_query(&self, messages: &[Message], call: &WebSearchCall) -> String {
        if self.config.convert_query
            && let Some(query) = QueryConverter::new(self.model).condense(messages).await
        {
            return query;
        }
        latest_user_text(messages)
            .map(str::to_string)
            .unwrap_or_else(|| call.query.clone())
    }
}

//! Agent runtime: the per-turn [`Orchestrator`](orchestrator::Orchestrator)
//! and its supporting modules.
//!
//! - [`orchestrator`] — drives one end-to-end turn: tool probe, optional
//!   retrieval, augmented final generation. Start here.
//! - [`retrieval`] — [`RetrievalPipeline`](retrieval::RetrievalPipeline):
//!   search, fetch, and per-page summarization with skip-on-failure.
//! - [`query`] — [`QueryConverter`](query::QueryConverter) condenses the
//!   conversation into a single-line search-engine query.
//! - [`config`] — [`OrchestratorConfig`](config::OrchestratorConfig) for
//!   link counts, budgets, and sampling.
//! - [`prompt`] — the system instruction and the synthetic user message
//!   that carries retrieved context, both date-stamped.

pub mod config;
pub mod orchestrator;
pub mod prompt;
pub mod query;
pub mod retrieval;

// Re-export commonly used items at the module level.
pub use config::{DEFAULT_TOP_LINKS, OrchestratorConfig};
pub use orchestrator::{Orchestrator, TURN_CANCELLED};
pub use query::QueryConverter;
pub use retrieval::RetrievalPipeline;

//! Context window management: the token budget and the recursive
//! summarizer.
//!
//! The context window is the scarcest resource when a 3B local model has
//! to read the open web. This module keeps arbitrary page content inside
//! that window:
//!
//! 1. **[`budget`]** — [`TokenBudget`] computes the working budget: the
//!    model's context window minus a fixed reserve for prompt scaffolding
//!    and expected output.
//!
//! 2. **[`summarizer`]** — [`RecursiveSummarizer`](summarizer::RecursiveSummarizer)
//!    collapses text of any length into a query-anchored summary that
//!    fits the working budget, splitting oversized input into token
//!    windows and summarizing recursively.

pub mod budget;
pub mod summarizer;

// Re-export commonly used items at the module level.
pub use budget::{DEFAULT_CONTEXT_WINDOW, DEFAULT_RESERVED_OVERHEAD, TokenBudget};
pub use summarizer::{RecursiveSummarizer, SummarizerConfig};

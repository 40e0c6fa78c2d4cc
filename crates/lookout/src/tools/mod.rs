//! The web-search tool: its wire definition and the parser that recovers
//! invocations from raw model output.
//!
//! Exactly one tool exists today, so a parsed call is a closed sum type
//! ([`ToolInvocation`](spec::ToolInvocation)) rather than an open
//! name/parameter map — future tools become new variants.
//!
//! - [`spec`] — the `search_web` tool definition sent to the model and
//!   the typed [`WebSearchCall`](spec::WebSearchCall) it parses into.
//! - [`parser`] — scans a completion for the `<tool_call>` delimiter
//!   pair and decodes the enclosed JSON. Absent or malformed payloads
//!   mean "the model chose not to call a tool", never an error.

pub mod parser;
pub mod spec;

// Re-export commonly used items at the module level.
pub use parser::{TOOL_CALL_END, TOOL_CALL_START, parse_tool_call};
pub use spec::{ToolInvocation, WEB_SEARCH_TOOL_NAME, WebSearchCall, web_search_tool_def};

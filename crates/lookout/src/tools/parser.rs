//! Tool-call parser: recover a structured invocation from raw model
//! output.
//!
//! Models that elect to call a tool emit a reserved delimiter pair around
//! a JSON payload:
//!
//! ```text
//! <tool_call>{"name": "search_web", "parameters": {"query": "f1 race"}}</tool_call>
//! ```
//!
//! Every failure mode — no markers, unterminated marker, invalid JSON,
//! unknown tool name, schema-invalid or missing parameters — yields
//! `None`, meaning "the model chose not to call a tool". The caller
//! proceeds with plain generation; parsing never errors.

use crate::json_schema_for;
use crate::tools::spec::{ToolInvocation, WEB_SEARCH_TOOL_NAME, WebSearchCall};
use serde::Deserialize;
use tracing::{debug, trace};

/// Start marker of an embedded tool invocation.
pub const TOOL_CALL_START: &str = "<tool_call>";
/// End marker of an embedded tool invocation.
pub const TOOL_CALL_END: &str = "</tool_call>";

/// Wire shape of the delimited payload: an open name/parameters map.
/// Typed into [`ToolInvocation`] only after validation.
#[derive(Deserialize, Debug)]
struct WireToolCall {
    name: String,
    #[serde(default)]
    parameters: serde_json::Map<String, serde_json::Value>,
}

/// Extract a tool invocation from a raw completion, if one is present
/// and well-formed.
pub fn parse_tool_call(raw: &str) -> Option<ToolInvocation> {
    let start = raw.find(TOOL_CALL_START)? + TOOL_CALL_START.len();
    let end = start + raw.get(start..)?.find(TOOL_CALL_END)?;
    let payload = raw.get(start..end)?.trim();
    trace!("tool-call payload: {payload}");

    let wire: WireToolCall = match serde_json::from_str(payload) {
        Ok(w) => w,
        Err(e) => {
            debug!("tool-call payload did not decode ({e}); treating as no call");
            return None;
        }
    };

    if wire.name != WEB_SEARCH_TOOL_NAME {
        debug!("unknown tool '{}'; treating as no call", wire.name);
        return None;
    }

    // Validate the open parameter map against the tool's schema before
    // typing it; a missing or non-string `query` is "no call", not an error.
    let parameters = serde_json::Value::Object(wire.parameters);
    let schema = json_schema_for::<WebSearchCall>();
    let validator = jsonschema::validator_for(&schema).ok()?;
    if let Some(error) = validator.iter_errors(&parameters).next() {
        debug!("tool-call parameters failed validation: {error}");
        return None;
    }

    let call: WebSearchCall = serde_json::from_value(parameters).ok()?;
    if call.query.trim().is_empty() {
        debug!("tool call with empty query; treating as no call");
        return None;
    }
    Some(ToolInvocation::WebSearch(call))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_no_call() {
        assert_eq!(parse_tool_call("The answer is 42."), None);
    }

    #[test]
    fn valid_call_parses() {
        let raw = r#"<tool_call>{"name":"search_web","parameters":{"query":"f1 race"}}</tool_call>"#;
        assert_eq!(
            parse_tool_call(raw),
            Some(ToolInvocation::WebSearch(WebSearchCall {
                query: "f1 race".into()
            }))
        );
    }

    #[test]
    fn call_embedded_in_prose_parses() {
        let raw = format!(
            "I'll look that up.\n<tool_call>{}</tool_call>\nOne moment.",
            r#"{"name": "search_web", "parameters": {"query": "latest rust release"}}"#
        );
        assert!(matches!(
            parse_tool_call(&raw),
            Some(ToolInvocation::WebSearch(call)) if call.query == "latest rust release"
        ));
    }

    #[test]
    fn invalid_payload_is_no_call_not_a_crash() {
        assert_eq!(parse_tool_call("<tool_call>{broken json</tool_call>"), None);
    }

    #[test]
    fn unterminated_marker_is_no_call() {
        assert_eq!(
            parse_tool_call(r#"<tool_call>{"name":"search_web","parameters":{}}"#),
            None
        );
    }

    #[test]
    fn unknown_tool_name_is_no_call() {
        let raw = r#"<tool_call>{"name":"send_email","parameters":{"query":"x"}}</tool_call>"#;
        assert_eq!(parse_tool_call(raw), None);
    }

    #[test]
    fn missing_query_parameter_is_no_call() {
        let raw = r#"<tool_call>{"name":"search_web","parameters":{}}</tool_call>"#;
        assert_eq!(parse_tool_call(raw), None);
        let raw = r#"<tool_call>{"name":"search_web"}</tool_call>"#;
        assert_eq!(parse_tool_call(raw), None);
    }

    #[test]
    fn non_string_query_is_no_call() {
        let raw = r#"<tool_call>{"name":"search_web","parameters":{"query":7}}</tool_call>"#;
        assert_eq!(parse_tool_call(raw), None);
    }

    #[test]
    fn blank_query_is_no_call() {
        let raw = r#"<tool_call>{"name":"search_web","parameters":{"query":"  "}}</tool_call>"#;
        assert_eq!(parse_tool_call(raw), None);
    }
}

//! The web-search tool specification.
//!
//! The definition is sent with the tool-probe request so the runtime's
//! chat template can advertise the tool; the model elects to use it by
//! emitting a delimited invocation (see [`parser`](crate::tools::parser)).

use crate::{ToolDef, json_schema_for};
use schemars::JsonSchema;
use serde::Deserialize;

/// Name of the single tool the model may call.
pub const WEB_SEARCH_TOOL_NAME: &str = "search_web";

/// Arguments of a `search_web` invocation.
///
/// Doubles as the JSON Schema source for the tool definition and for
/// validating decoded invocation payloads.
#[derive(Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
pub struct WebSearchCall {
    /// The query to send to the search engine
    pub query: String,
}

/// A tool invocation parsed from model output.
///
/// A closed sum type: only web search exists today; additional tools
/// become new variants rather than entries in an open map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolInvocation {
    WebSearch(WebSearchCall),
}

/// The `search_web` tool definition in function-calling wire format.
pub fn web_search_tool_def() -> ToolDef {
    ToolDef::new(
        WEB_SEARCH_TOOL_NAME,
        "Get up-to-date information through web search",
        json_schema_for::<WebSearchCall>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_has_required_query_parameter() {
        let def = web_search_tool_def();
        assert_eq!(def.function.name, "search_web");
        let params = &def.function.parameters;
        assert_eq!(params["type"], "object");
        assert!(
            params["required"]
                .as_array()
                .unwrap()
                .contains(&"query".into())
        );
        assert_eq!(params["properties"]["query"]["type"], "string");
    }

    #[test]
    fn call_deserializes_from_parameters_object() {
        let call: WebSearchCall =
            serde_json::from_value(serde_json::json!({"query": "f1 race"})).unwrap();
        assert_eq!(call.query, "f1 race");
    }
}

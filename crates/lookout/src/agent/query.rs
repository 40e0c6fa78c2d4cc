//! Query conversion: condense the conversation into a single-line
//! search-engine query.
//!
//! Multi-turn conversations make poor search queries ("what about the
//! year before?" means nothing to a search engine). One cheap structured
//! generation call folds all user messages into a standalone query used
//! to anchor summarization and the context-injection message. Failure
//! here is never fatal — callers fall back to the latest user message.

use crate::api::{GenerationRequest, ModelRuntime};
use crate::{Message, MessageRole};
use serde::Deserialize;
use tracing::debug;

const CONVERTER_PROMPT: &str = "\
You are a helpful assistant that turns the user conversation into a short \
single-line query feedable to a search engine. \
Reply with a JSON object of the form {\"query\": \"...\"} and nothing else.";

/// Response token cap: a search query is a dozen words at most.
const CONVERTER_MAX_TOKENS: u32 = 128;

/// Structured output of the conversion call.
#[derive(Deserialize, Debug)]
struct ConvertedQuery {
    query: String,
}

/// Condenses user messages into a search-engine query via the model.
pub struct QueryConverter<'a> {
    model: &'a dyn ModelRuntime,
}

impl<'a> QueryConverter<'a> {
    pub fn new(model: &'a dyn ModelRuntime) -> Self {
        Self { model }
    }

    /// Produce a single-line query for the conversation, or `None` if
    /// there are no user messages or the conversion call fails.
    pub async fn condense(&self, messages: &[Message]) -> Option<String> {
        let user_queries = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if user_queries.trim().is_empty() {
            return None;
        }

        let request = GenerationRequest::new(vec![
            Message::system(CONVERTER_PROMPT),
            Message::user(format!(
                "USER_QUERIES: {user_queries}\n\
                 Turn the USER_QUERIES into a short single-line query \
                 feedable to a search engine."
            )),
        ])
        .with_max_tokens(CONVERTER_MAX_TOKENS)
        .with_temperature(0.2);

        let output = match self.model.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                debug!("query conversion failed: {e}");
                return None;
            }
        };

        let converted = parse_converted_query(&output)?;
        debug!("converted query: {converted}");
        Some(converted)
    }
}

/// Extract the `query` field from the (possibly prose-wrapped) JSON reply.
fn parse_converted_query(output: &str) -> Option<String> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    let payload = output.get(start..=end)?;
    let parsed: ConvertedQuery = serde_json::from_str(payload).ok()?;
    let query = parsed.query.trim().replace('\n', " ");
    if query.is_empty() { None } else { Some(query) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{GenerationFuture, SnapshotHandler};

    /// Model stub returning a canned reply and capturing the request.
    struct CannedModel {
        reply: Result<String, String>,
        seen: std::sync::Mutex<Vec<GenerationRequest>>,
    }

    impl CannedModel {
        fn new(reply: Result<String, String>) -> Self {
            Self {
                reply,
                seen: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl ModelRuntime for CannedModel {
        fn generate(&self, request: GenerationRequest) -> GenerationFuture<'_> {
            self.seen.lock().unwrap().push(request);
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }

        fn generate_stream<'b>(
            &'b self,
            request: GenerationRequest,
            _on_snapshot: SnapshotHandler<'b>,
        ) -> GenerationFuture<'b> {
            self.generate(request)
        }
    }

    #[tokio::test]
    async fn condenses_user_messages_into_query() {
        let model = CannedModel::new(Ok(r#"{"query": "monaco gp 2025 winner"}"#.into()));
        let converter = QueryConverter::new(&model);
        let messages = vec![
            Message::system("sys"),
            Message::user("who won the race in monaco?"),
            Message::assistant("Which year?"),
            Message::user("this year"),
        ];

        let query = converter.condense(&messages).await;
        assert_eq!(query.as_deref(), Some("monaco gp 2025 winner"));

        // Both user messages reach the converter; assistant text does not.
        let seen = model.seen.lock().unwrap();
        let prompt = &seen[0].messages[1].content;
        assert!(prompt.contains("who won the race in monaco?"));
        assert!(prompt.contains("this year"));
        assert!(!prompt.contains("Which year?"));
    }

    #[tokio::test]
    async fn prose_wrapped_json_still_parses() {
        let model =
            CannedModel::new(Ok("Sure! {\"query\": \"rust 1.93 release date\"}".into()));
        let converter = QueryConverter::new(&model);
        let query = converter.condense(&[Message::user("when did rust ship")]).await;
        assert_eq!(query.as_deref(), Some("rust 1.93 release date"));
    }

    #[tokio::test]
    async fn model_error_yields_none() {
        let model = CannedModel::new(Err("model runtime HTTP 500".into()));
        let converter = QueryConverter::new(&model);
        assert!(converter.condense(&[Message::user("q")]).await.is_none());
    }

    #[tokio::test]
    async fn non_json_reply_yields_none() {
        let model = CannedModel::new(Ok("I can't do that.".into()));
        let converter = QueryConverter::new(&model);
        assert!(converter.condense(&[Message::user("q")]).await.is_none());
    }

    #[tokio::test]
    async fn no_user_messages_makes_no_call() {
        let model = CannedModel::new(Ok("unused".into()));
        let converter = QueryConverter::new(&model);
        assert!(converter.condense(&[Message::system("sys")]).await.is_none());
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_empty_query() {
        assert!(parse_converted_query(r#"{"query": "  "}"#).is_none());
        assert!(parse_converted_query("no json here").is_none());
    }
}

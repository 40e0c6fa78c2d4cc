//! End-to-end turn tests against a stubbed model/search/fetch triad.

use lookout::api::{GenerationFuture, GenerationRequest, ModelRuntime, SnapshotHandler};
use lookout::prelude::*;
use lookout::web::{FetchFuture, SearchFuture};
use std::collections::VecDeque;
use std::sync::Mutex;

const PAGE_TEXT: &str =
    "Race report: Verstappen won the Grand Prix yesterday ahead of Norris and Leclerc.";
const PAGE_SUMMARY: &str = "Verstappen won yesterday's Grand Prix, ahead of Norris.";
const FINAL_ANSWER: &str = "Verstappen won yesterday's race.";
const PROBE_CALL: &str =
    r#"<tool_call>{"name":"search_web","parameters":{"query":"grand prix winner"}}</tool_call>"#;

/// Replays scripted completions in order and records every request.
struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn next_reply(&self, request: GenerationRequest) -> String {
        self.requests.lock().unwrap().push(request);
        self.replies.lock().unwrap().pop_front().unwrap_or_default()
    }

    fn final_request_messages(&self) -> Vec<Message> {
        self.requests.lock().unwrap().last().unwrap().messages.clone()
    }
}

impl ModelRuntime for ScriptedModel {
    fn generate(&self, request: GenerationRequest) -> GenerationFuture<'_> {
        let reply = self.next_reply(request);
        Box::pin(async move { Ok(reply) })
    }

    fn generate_stream<'a>(
        &'a self,
        request: GenerationRequest,
        mut on_snapshot: SnapshotHandler<'a>,
    ) -> GenerationFuture<'a> {
        let reply = self.next_reply(request);
        Box::pin(async move {
            // Two snapshots: a partial one, then the full decode-and-replace.
            let half = reply.len() / 2;
            if let Some(partial) = reply.get(..half) {
                on_snapshot(partial);
            }
            on_snapshot(&reply);
            Ok(reply)
        })
    }
}

struct StubSearch {
    results: Vec<SearchResult>,
}

impl SearchProvider for StubSearch {
    fn search<'a>(&'a self, _query: &'a str) -> SearchFuture<'a> {
        let results = self.results.clone();
        Box::pin(async move { Ok(results) })
    }
}

struct StubFetch;

impl FetchProvider for StubFetch {
    fn fetch_markdown<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> {
        Box::pin(async { Ok(PAGE_TEXT.to_string()) })
    }
}

/// Records every status transition; `None` marks a clear.
#[derive(Default)]
struct RecordingStatus {
    events: Mutex<Vec<Option<String>>>,
}

impl StatusSink for RecordingStatus {
    fn set_status(&self, status: &str) {
        self.events.lock().unwrap().push(Some(status.to_string()));
    }

    fn clear_status(&self) {
        self.events.lock().unwrap().push(None);
    }
}

impl RecordingStatus {
    fn saw(&self, needle: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .any(|s| s.contains(needle))
    }

    fn cleared_last(&self) -> bool {
        self.events.lock().unwrap().last() == Some(&None)
    }
}

fn one_link() -> StubSearch {
    StubSearch {
        results: vec![SearchResult {
            title: "Race report".into(),
            url: "https://news.example/race".into(),
        }],
    }
}

#[tokio::test]
async fn retrieved_context_reaches_the_final_prompt() {
    // Calls in order: probe, page summarization, final stream.
    let model = ScriptedModel::new(&[PROBE_CALL, PAGE_SUMMARY, FINAL_ANSWER]);
    let search = one_link();
    let tokenizer = Cl100kTokenizer::new().unwrap();
    let status = RecordingStatus::default();

    let snapshots: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let orchestrator = Orchestrator::new(&model, &search, &StubFetch, &tokenizer)
        .with_status(&status)
        .with_config(OrchestratorConfig::default().with_convert_query(false));

    let answer = orchestrator
        .run_turn(
            vec![Message::user("who won yesterday's race?")],
            true,
            |snapshot| snapshots.lock().unwrap().push(snapshot.to_string()),
        )
        .await
        .unwrap();
    assert_eq!(answer, FINAL_ANSWER);

    // The final prompt carries the original question and the page summary.
    let final_messages = model.final_request_messages();
    let context = final_messages
        .iter()
        .find(|m| m.content.contains("Up-to-date information"))
        .expect("augmented context message must be appended");
    assert_eq!(context.role, MessageRole::User);
    assert!(context.content.contains("who won yesterday's race?"));
    assert!(context.content.contains(PAGE_SUMMARY));

    // Snapshots are decode-and-replace: the last one is the whole answer.
    let snapshots = snapshots.into_inner().unwrap();
    assert!(snapshots.len() >= 2);
    assert_eq!(snapshots.last().unwrap(), FINAL_ANSWER);
    assert!(FINAL_ANSWER.starts_with(&snapshots[snapshots.len() - 2]));

    // Status narrated each stage and was cleared at the end.
    assert!(status.saw("Performing web search for grand prix winner"));
    assert!(status.saw("Reading https://news.example/race"));
    assert!(status.saw("Summarizing https://news.example/race"));
    assert!(status.saw("Finalizing answer..."));
    assert!(status.cleared_last());
}

#[tokio::test]
async fn converted_query_anchors_the_context_message() {
    // Calls in order: probe, query conversion, summarization, final stream.
    let model = ScriptedModel::new(&[
        PROBE_CALL,
        r#"{"query": "grand prix winner yesterday"}"#,
        PAGE_SUMMARY,
        FINAL_ANSWER,
    ]);
    let search = one_link();
    let tokenizer = Cl100kTokenizer::new().unwrap();

    let orchestrator = Orchestrator::new(&model, &search, &StubFetch, &tokenizer);
    orchestrator
        .run_turn(vec![Message::user("who won yesterday's race?")], true, |_| {})
        .await
        .unwrap();

    let final_messages = model.final_request_messages();
    let context = final_messages
        .iter()
        .find(|m| m.content.contains("Up-to-date information"))
        .unwrap();
    assert!(context.content.contains("QUERY: grand prix winner yesterday"));
}

#[tokio::test]
async fn zero_search_results_answer_from_conversation_alone() {
    let model = ScriptedModel::new(&[
        PROBE_CALL,
        r#"{"query": "grand prix winner"}"#,
        FINAL_ANSWER,
    ]);
    let search = StubSearch {
        results: Vec::new(),
    };
    let tokenizer = Cl100kTokenizer::new().unwrap();
    let status = RecordingStatus::default();

    let orchestrator =
        Orchestrator::new(&model, &search, &StubFetch, &tokenizer).with_status(&status);
    let answer = orchestrator
        .run_turn(vec![Message::user("who won yesterday's race?")], true, |_| {})
        .await
        .unwrap();
    assert_eq!(answer, FINAL_ANSWER);

    let final_messages = model.final_request_messages();
    assert!(
        !final_messages
            .iter()
            .any(|m| m.content.contains("Up-to-date information")),
        "no context message without search results"
    );
    assert!(status.cleared_last());
}

#[tokio::test]
async fn web_search_disabled_never_touches_providers() {
    struct PanickingSearch;
    impl SearchProvider for PanickingSearch {
        fn search<'a>(&'a self, _query: &'a str) -> SearchFuture<'a> {
            panic!("search must not be called with web search disabled");
        }
    }

    // Even a probe that emits a tool call must not trigger retrieval.
    let model = ScriptedModel::new(&[PROBE_CALL, FINAL_ANSWER]);
    let tokenizer = Cl100kTokenizer::new().unwrap();

    let orchestrator = Orchestrator::new(&model, &PanickingSearch, &StubFetch, &tokenizer);
    let answer = orchestrator
        .run_turn(vec![Message::user("hello")], false, |_| {})
        .await
        .unwrap();
    assert_eq!(answer, FINAL_ANSWER);
}

#[tokio::test]
async fn model_failure_surfaces_an_error_and_clears_status() {
    struct DeadModel;
    impl ModelRuntime for DeadModel {
        fn generate(&self, _request: GenerationRequest) -> GenerationFuture<'_> {
            Box::pin(async { Err("request failed: connection refused".to_string()) })
        }
        fn generate_stream<'a>(
            &'a self,
            _request: GenerationRequest,
            _on_snapshot: SnapshotHandler<'a>,
        ) -> GenerationFuture<'a> {
            Box::pin(async { Err("request failed: connection refused".to_string()) })
        }
    }

    let search = one_link();
    let tokenizer = Cl100kTokenizer::new().unwrap();
    let status = RecordingStatus::default();

    let orchestrator =
        Orchestrator::new(&DeadModel, &search, &StubFetch, &tokenizer).with_status(&status);
    let err = orchestrator
        .run_turn(vec![Message::user("hello")], true, |_| {})
        .await
        .unwrap_err();
    assert!(err.starts_with("model unavailable:"));
    assert!(status.cleared_last());
}

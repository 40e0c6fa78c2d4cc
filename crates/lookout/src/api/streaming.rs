//! Server-Sent Events (SSE) parsing for the chat-completions stream.
//!
//! Local runtimes emit OpenAI-style SSE: one `data: {json}` line per token
//! batch and a terminal `data: [DONE]` line. [`SseAssembler`] turns raw
//! network chunks into [`StreamEvent`] values; chunk boundaries need not
//! align with line boundaries, so a partial line is carried between
//! `push()` calls.

use crate::api::UsageInfo;
use serde::Deserialize;
use tracing::{trace, warn};

/// A single event from the completion stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// An incremental text content delta.
    TextDelta(String),
    /// Token usage information (sent in the final chunk).
    Usage(UsageInfo),
    /// The stream is complete.
    Done,
}

/// Raw SSE data chunk from the runtime.
#[derive(Deserialize, Debug)]
struct StreamChunk {
    choices: Option<Vec<StreamChoice>>,
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Option<StreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

/// Incremental assembler from raw body chunks to [`StreamEvent`]s.
///
/// Feed each network chunk to [`push()`](Self::push); call
/// [`finish()`](Self::finish) when the body ends to flush a trailing
/// partial line and guarantee a terminal [`StreamEvent::Done`].
#[derive(Default)]
pub struct SseAssembler {
    buffer: String,
    done: bool,
}

impl SseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal `[DONE]` line has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Ingest one body chunk, appending any completed events to `events`.
    pub fn push(&mut self, chunk: &[u8], events: &mut Vec<StreamEvent>) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        // Process all complete lines in the buffer.
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            self.ingest_line(line.trim(), events);
            if self.done {
                return;
            }
        }
    }

    /// Flush a trailing partial line and ensure a terminal `Done` event.
    pub fn finish(&mut self, events: &mut Vec<StreamEvent>) {
        let remaining = std::mem::take(&mut self.buffer);
        if !self.done {
            self.ingest_line(remaining.trim(), events);
        }
        if !self.done {
            events.push(StreamEvent::Done);
            self.done = true;
        }
    }

    fn ingest_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        // SSE comments start with ':'; keep-alives are empty lines.
        if line.is_empty() || line.starts_with(':') {
            return;
        }
        if line == "data: [DONE]" {
            events.push(StreamEvent::Done);
            self.done = true;
            return;
        }
        if let Some(data) = line.strip_prefix("data: ") {
            parse_sse_data(data, events);
        }
    }
}

/// Parse a single SSE `data:` payload into stream events.
fn parse_sse_data(data: &str, events: &mut Vec<StreamEvent>) {
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            if let Some(usage) = chunk.usage {
                events.push(StreamEvent::Usage(usage));
            }
            if let Some(choices) = chunk.choices {
                for choice in choices {
                    if let Some(delta) = choice.delta
                        && let Some(content) = delta.content
                        && !content.is_empty()
                    {
                        events.push(StreamEvent::TextDelta(content));
                    }
                    if choice.finish_reason.is_some() {
                        trace!("stream finish_reason: {:?}", choice.finish_reason);
                    }
                }
            }
        }
        Err(e) => {
            warn!("failed to parse SSE chunk: {e} — data: {data}");
        }
    }
}

/// Assemble the complete text from a sequence of stream events.
pub fn collect_text(events: &[StreamEvent]) -> String {
    let mut text = String::new();
    for event in events {
        if let StreamEvent::TextDelta(delta) = event {
            text.push_str(delta);
        }
    }
    text
}

/// Extract usage info from stream events (if present).
pub fn extract_usage(events: &[StreamEvent]) -> Option<UsageInfo> {
    for event in events.iter().rev() {
        if let StreamEvent::Usage(usage) = event {
            return Some(usage.clone());
        }
    }
    None
}

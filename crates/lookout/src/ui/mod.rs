//! Transient status reporting for long-running turn stages.
//!
//! The orchestrator and retrieval pipeline narrate their progress
//! ("Performing web search for ...", "Reading https://...") through a
//! [`StatusSink`]. The sink is a fire-and-forget side channel: it never
//! affects control flow, offers no acknowledgement, and "latest wins" is
//! the only display guarantee. It is injected rather than global so the
//! core stays testable without a UI.
//!
//! # Choosing a sink
//!
//! | Sink | Use case |
//! |------|----------|
//! | [`NoopStatus`] | Tests or headless runs |
//! | [`TracingStatus`] | Structured logging via `tracing` |
//! | [`FnStatusSink`] | Quick closures (CLI spinners, TUI labels) |

use tracing::info;

/// Fire-and-forget sink for transient human-readable status text.
///
/// Implementations must be cheap and non-blocking; callers emit a status
/// immediately before each long-running stage and clear it when the turn
/// completes or aborts.
pub trait StatusSink: Send + Sync {
    /// Replace the currently displayed status.
    fn set_status(&self, status: &str);

    /// Remove the currently displayed status.
    fn clear_status(&self);
}

/// A status sink that discards everything.
pub struct NoopStatus;

impl StatusSink for NoopStatus {
    fn set_status(&self, _status: &str) {}
    fn clear_status(&self) {}
}

/// A status sink that logs transitions via `tracing` at INFO level.
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn set_status(&self, status: &str) {
        info!("[status] {status}");
    }

    fn clear_status(&self) {
        info!("[status] cleared");
    }
}

/// A status sink backed by a closure.
///
/// The closure receives `Some(text)` for updates and `None` for clears,
/// avoiding the boilerplate of a full struct-and-impl for simple display
/// handling.
///
/// # Example
///
/// ```
/// use lookout::ui::{FnStatusSink, StatusSink};
///
/// let sink = FnStatusSink::new(|status| {
///     if let Some(text) = status {
///         eprintln!("· {text}");
///     }
/// });
/// sink.set_status("Reading https://example.com");
/// sink.clear_status();
/// ```
pub struct FnStatusSink<F>(F)
where
    F: Fn(Option<&str>) + Send + Sync;

impl<F> FnStatusSink<F>
where
    F: Fn(Option<&str>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> StatusSink for FnStatusSink<F>
where
    F: Fn(Option<&str>) + Send + Sync,
{
    fn set_status(&self, status: &str) {
        (self.0)(Some(status));
    }

    fn clear_status(&self) {
        (self.0)(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fn_sink_latest_wins() {
        let seen: Mutex<Vec<Option<String>>> = Mutex::new(Vec::new());
        let sink = FnStatusSink::new(|status| {
            seen.lock().unwrap().push(status.map(str::to_string));
        });

        sink.set_status("first");
        sink.set_status("second");
        sink.clear_status();

        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![Some("first".to_string()), Some("second".to_string()), None]
        );
    }

    #[test]
    fn noop_sink_is_silent() {
        // Just exercise the no-op paths.
        NoopStatus.set_status("ignored");
        NoopStatus.clear_status();
    }
}

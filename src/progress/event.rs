//! Progress events pushed by the server and the UI sinks they drive.
//!
//! The server emits one `processing_progress` event per work step. Each event
//! is tagged with a [`Stage`] and routed to exactly one [`ProgressSink`]
//! (extraction or generation). Events for stages this client does not know
//! are dropped at dispatch so future server stages never break the UI.
//!
//! Completion is *not* handled here: reaching 100 % changes nothing beyond
//! the normal update. Hiding a sink is the job of the request's own result
//! handler, which avoids racing the final progress tick against the response.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Work stage a progress event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Stage {
    /// Document text extraction (upload pipeline).
    Extract,
    /// Speech synthesis (generation pipeline).
    Generate,
    /// A stage tag this client does not recognise; ignored at dispatch.
    Other(String),
}

impl From<String> for Stage {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "extract" => Stage::Extract,
            "generate" => Stage::Generate,
            _ => Stage::Other(tag),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

/// One progress update for a single stage.
///
/// Invariant (server-side): `0 ≤ progress ≤ total` and `total > 0` while the
/// stage is active. The display math still guards both, see [`percentage`].
/// Transient: each event supersedes the previous one for the same stage.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub progress: u64,
    pub total: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Completion percentage for a progress/total pair.
///
/// `total = 0` is treated as 0 % rather than dividing by zero, and the result
/// is clamped to `[0, 100]` so a misbehaving server can never overflow the
/// bar.
pub fn percentage(progress: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (progress as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

// ---------------------------------------------------------------------------
// ProgressSink
// ---------------------------------------------------------------------------

/// UI state for one stage's progress display: container visibility,
/// percentage, and status line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSink {
    pub visible: bool,
    pub percentage: u8,
    pub message: String,
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self {
            visible: false,
            percentage: 0,
            message: String::new(),
        }
    }
}

impl ProgressSink {
    /// Reset to 0 % with an initial status line and make the sink visible.
    /// Called when the triggering request starts.
    pub fn reset(&mut self, initial_message: &str) {
        self.visible = true;
        self.percentage = 0;
        self.message = initial_message.to_owned();
    }

    /// Hide the sink. Called by the request's result handler, never by the
    /// progress channel itself. Idempotent.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Apply one progress event: show the container, update the percentage,
    /// and replace the status line when a message is present.
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.visible = true;
        self.percentage = percentage(event.progress, event.total);
        if let Some(msg) = &event.message {
            self.message = msg.clone();
        }
    }

    /// Bar fill fraction in `[0, 1]` for the progress widget.
    pub fn fraction(&self) -> f32 {
        f32::from(self.percentage) / 100.0
    }
}

// ---------------------------------------------------------------------------
// ProgressSinks — stage dispatch
// ---------------------------------------------------------------------------

/// The two stage sinks plus the dispatch that routes events between them.
#[derive(Debug, Clone, Default)]
pub struct ProgressSinks {
    pub extract: ProgressSink,
    pub generate: ProgressSink,
}

impl ProgressSinks {
    /// Route an event to the sink for its stage. Unknown stages are ignored
    /// without error. An extract event never touches the generate sink and
    /// vice versa.
    pub fn route(&mut self, event: &ProgressEvent) {
        match &event.stage {
            Stage::Extract => self.extract.apply(event),
            Stage::Generate => self.generate.apply(event),
            Stage::Other(tag) => {
                log::debug!("ignoring progress event for unknown stage {tag:?}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event(stage: &str, progress: u64, total: u64, message: Option<&str>) -> ProgressEvent {
        ProgressEvent {
            stage: Stage::from(stage.to_owned()),
            progress,
            total,
            message: message.map(str::to_owned),
        }
    }

    // ---- percentage ---

    #[test]
    fn percentage_rounds() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
    }

    #[test]
    fn percentage_zero_total_is_zero() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn percentage_clamps_to_hundred() {
        // Violates the server invariant, must still not overflow the bar.
        assert_eq!(percentage(7, 3), 100);
        assert_eq!(percentage(100, 100), 100);
    }

    // ---- Stage parsing ---

    #[test]
    fn stage_tags_parse() {
        let ev: ProgressEvent =
            serde_json::from_str(r#"{"stage":"extract","progress":3,"total":10}"#).unwrap();
        assert_eq!(ev.stage, Stage::Extract);
        assert!(ev.message.is_none());

        let ev: ProgressEvent = serde_json::from_str(
            r#"{"stage":"generate","progress":1,"total":4,"message":"Synthesizing"}"#,
        )
        .unwrap();
        assert_eq!(ev.stage, Stage::Generate);
        assert_eq!(ev.message.as_deref(), Some("Synthesizing"));
    }

    #[test]
    fn unknown_stage_parses_as_other() {
        let ev: ProgressEvent =
            serde_json::from_str(r#"{"stage":"transcode","progress":1,"total":2}"#).unwrap();
        assert_eq!(ev.stage, Stage::Other("transcode".into()));
    }

    // ---- ProgressSink ---

    #[test]
    fn apply_updates_percentage_and_message() {
        let mut sink = ProgressSink::default();
        sink.apply(&event("extract", 5, 10, Some("Reading pages")));
        assert!(sink.visible);
        assert_eq!(sink.percentage, 50);
        assert_eq!(sink.message, "Reading pages");
    }

    #[test]
    fn apply_without_message_keeps_previous_text() {
        let mut sink = ProgressSink::default();
        sink.reset("Starting");
        sink.apply(&event("extract", 1, 4, None));
        assert_eq!(sink.message, "Starting");
        assert_eq!(sink.percentage, 25);
    }

    #[test]
    fn reaching_full_does_not_hide_the_sink() {
        let mut sink = ProgressSink::default();
        sink.apply(&event("generate", 10, 10, None));
        assert_eq!(sink.percentage, 100);
        assert!(sink.visible, "teardown belongs to the result handler");
    }

    #[test]
    fn hide_is_idempotent() {
        let mut sink = ProgressSink::default();
        sink.reset("x");
        sink.hide();
        sink.hide();
        assert!(!sink.visible);
    }

    // ---- ProgressSinks routing ---

    #[test]
    fn extract_event_never_touches_generate_sink() {
        let mut sinks = ProgressSinks::default();
        sinks.route(&event("extract", 5, 10, Some("extracting")));

        assert!(sinks.extract.visible);
        assert_eq!(sinks.extract.percentage, 50);
        assert_eq!(sinks.generate, ProgressSink::default());
    }

    #[test]
    fn generate_event_never_touches_extract_sink() {
        let mut sinks = ProgressSinks::default();
        sinks.route(&event("generate", 1, 4, None));

        assert!(sinks.generate.visible);
        assert_eq!(sinks.extract, ProgressSink::default());
    }

    #[test]
    fn unknown_stage_is_ignored() {
        let mut sinks = ProgressSinks::default();
        sinks.route(&event("transcode", 9, 10, Some("nope")));

        assert_eq!(sinks.extract, ProgressSink::default());
        assert_eq!(sinks.generate, ProgressSink::default());
    }
}

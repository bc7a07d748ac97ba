//! Progress channel — server push events and the stage sinks they drive.
//!
//! * [`ProgressEvent`] / [`Stage`] — one progress update, tagged by stage.
//! * [`ProgressSink`] / [`ProgressSinks`] — per-stage display state and the
//!   dispatch that routes each event to exactly one sink.
//! * [`run_progress_listener`] — background task that subscribes to the
//!   server's SSE stream and forwards events to the UI.

pub mod event;
pub mod listener;

pub use event::{percentage, ProgressEvent, ProgressSink, ProgressSinks, Stage};
pub use listener::{run_progress_listener, SseFrame, SseParser};

//! Desktop client for a document-to-speech server.
//!
//! Upload a document (pdf / jpg / jpeg / png / txt) or type text directly;
//! the server extracts the text, detects its language, and synthesizes
//! speech. This client streams progress over the server's push channel,
//! previews the extracted text, and plays the generated audio with transport
//! controls and a download option.
//!
//! Module map:
//! * [`api`] — HTTP client and wire types.
//! * [`app`] — egui application: cards, sinks, channel polling.
//! * [`config`] — settings and platform paths.
//! * [`lang`] — language code → display name table.
//! * [`player`] — audio playback state machine and rodio backend.
//! * [`progress`] — server push channel and per-stage progress sinks.
//! * [`upload`] — single-file upload validation and lifecycle.

pub mod api;
pub mod app;
pub mod config;
pub mod lang;
pub mod player;
pub mod progress;
pub mod upload;

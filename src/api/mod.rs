//! HTTP interface to the document-to-speech server.
//!
//! * [`SpeechApi`] — async trait implemented by the transport backend.
//! * [`HttpSpeechApi`] — reqwest implementation used in production.
//! * Wire types: [`SpeechRequest`], [`SpeechResult`], [`UploadResult`],
//!   [`Gender`].
//! * [`ApiError`] — one error shape per server operation.

pub mod client;
pub mod types;

pub use client::{ApiError, HttpSpeechApi, SpeechApi};
pub use types::{Gender, SpeechRequest, SpeechResult, UploadResult};

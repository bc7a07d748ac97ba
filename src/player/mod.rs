//! Audio playback — the one piece of state-machine behavior the client owns.
//!
//! * [`AudioPlayer`] — controller over a single audio source.
//! * [`AudioOutput`] / [`RodioOutput`] — device seam and rodio backend.
//! * [`PlaybackState`] — lifecycle states and predicates.
//! * [`format_time`] / [`suggested_download_name`] — display helpers.

pub mod controller;
pub mod state;

pub use controller::{suggested_download_name, AudioOutput, AudioPlayer, MediaError, RodioOutput};
pub use state::{format_time, PlaybackState};

//! Playback state machine and time formatting.
//!
//! [`PlaybackState`] tracks a single audio source through its lifecycle:
//!
//! ```text
//! Empty ──fetch starts──▶ Loading ──decode ok──▶ Ready ⇄ Playing ⇄ Paused
//!                         Loading ──decode err─▶ Error
//! Playing ──source drained──▶ Ended ──play──▶ Playing (from 0)
//! any loaded state ──new load──▶ Loading   (previous source released first)
//! ```
//!
//! Transport controls are valid only in the loaded states; `Empty`, `Loading`
//! and `Error` reject them.

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Lifecycle state of the audio player's single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No source has been loaded yet.
    Empty,
    /// Audio bytes are being fetched / decoded.
    Loading,
    /// Decoded and ready; playback has not started.
    Ready,
    /// Audio is audible.
    Playing,
    /// Playback suspended; position retained.
    Paused,
    /// The source played to its natural end.
    Ended,
    /// The source failed to load or decode; controls inert until a new load.
    Error,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Empty
    }
}

impl PlaybackState {
    /// Whether a decoded source exists, i.e. transport controls are valid.
    pub fn is_loaded(self) -> bool {
        matches!(
            self,
            PlaybackState::Ready
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Ended
        )
    }

    /// Whether the per-frame progress display should be ticking.
    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }

    /// Short status label for the player card.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Empty => "No audio",
            PlaybackState::Loading => "Loading",
            PlaybackState::Ready => "Ready",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Ended => "Finished",
            PlaybackState::Error => "Audio error",
        }
    }
}

// ---------------------------------------------------------------------------
// Time formatting
// ---------------------------------------------------------------------------

/// Format a position in seconds as `M:SS` — zero-padded seconds, unbounded
/// minutes.
pub fn format_time(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 { secs } else { 0.0 };
    let minutes = (secs / 60.0).floor() as u64;
    let seconds = (secs - minutes as f64 * 60.0).floor() as u64;
    format!("{minutes}:{seconds:02}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- format_time ---

    #[test]
    fn format_time_zero() {
        assert_eq!(format_time(0.0), "0:00");
    }

    #[test]
    fn format_time_pads_seconds() {
        assert_eq!(format_time(65.0), "1:05");
    }

    #[test]
    fn format_time_just_under_ten_minutes() {
        assert_eq!(format_time(599.0), "9:59");
    }

    #[test]
    fn format_time_minutes_unbounded() {
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(3661.5), "61:01");
    }

    #[test]
    fn format_time_negative_and_nan_are_zero() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    // ---- PlaybackState predicates ---

    #[test]
    fn loaded_states() {
        assert!(!PlaybackState::Empty.is_loaded());
        assert!(!PlaybackState::Loading.is_loaded());
        assert!(!PlaybackState::Error.is_loaded());
        assert!(PlaybackState::Ready.is_loaded());
        assert!(PlaybackState::Playing.is_loaded());
        assert!(PlaybackState::Paused.is_loaded());
        assert!(PlaybackState::Ended.is_loaded());
    }

    #[test]
    fn only_playing_ticks() {
        assert!(PlaybackState::Playing.is_playing());
        assert!(!PlaybackState::Paused.is_playing());
        assert!(!PlaybackState::Ended.is_playing());
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(PlaybackState::default(), PlaybackState::Empty);
    }
}

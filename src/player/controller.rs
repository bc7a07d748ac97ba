//! Audio playback controller.
//!
//! [`AudioPlayer`] owns the lifecycle of the single audio source: load,
//! play/pause, restart, seek, rate change, end detection, and the download
//! filename. The actual sound device sits behind the [`AudioOutput`] trait so
//! the controller logic is testable without audio hardware; the production
//! backend is [`RodioOutput`].
//!
//! Position is derived on demand from the instant playback last started plus
//! the playback rate, so nothing ticks in the background while paused or
//! stopped. Seeks and rate changes rebuild the decoded source at the target
//! position, which is also what makes a rate change audible mid-play without
//! a jump: capture position, stop, restart at the new rate, resume there.

use std::io::Cursor;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rodio::Source;
use thiserror::Error;

use crate::player::state::PlaybackState;

// ---------------------------------------------------------------------------
// MediaError
// ---------------------------------------------------------------------------

/// Errors from the audio backend.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The audio bytes could not be decoded.
    #[error("error loading audio: {0}")]
    Decode(String),

    /// The output device is unavailable or rejected the sink.
    #[error("audio output unavailable: {0}")]
    Output(String),

    /// A transport control was used with no loaded source.
    #[error("no audio source loaded")]
    NoSource,
}

// ---------------------------------------------------------------------------
// AudioOutput trait
// ---------------------------------------------------------------------------

/// Seam between the controller and the sound device.
///
/// `start` replaces any live source with a fresh one decoded from `source`,
/// positioned `at` seconds in, at the given `rate`, optionally `paused`.
/// Returns the source's total duration. The backend must never keep two live
/// sources: starting releases the previous one first.
pub trait AudioOutput {
    fn start(
        &mut self,
        source: &Bytes,
        at: Duration,
        rate: f32,
        paused: bool,
    ) -> Result<Duration, MediaError>;

    /// Pause or resume the live source; no-op when none exists.
    fn set_paused(&mut self, paused: bool);

    /// Release the live source, if any.
    fn stop(&mut self);

    /// Whether the live source has drained (or none exists).
    fn finished(&self) -> bool;
}

// ---------------------------------------------------------------------------
// RodioOutput
// ---------------------------------------------------------------------------

/// Production [`AudioOutput`] backed by a rodio output stream and sink.
pub struct RodioOutput {
    // The stream must outlive every sink attached to it.
    _stream: rodio::OutputStream,
    handle: rodio::OutputStreamHandle,
    sink: Option<rodio::Sink>,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn new() -> Result<Self, MediaError> {
        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| MediaError::Output(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn start(
        &mut self,
        source: &Bytes,
        at: Duration,
        rate: f32,
        paused: bool,
    ) -> Result<Duration, MediaError> {
        self.stop();

        let decoder = rodio::Decoder::new(Cursor::new(source.clone()))
            .map_err(|e| MediaError::Decode(e.to_string()))?;
        let duration = decoder
            .total_duration()
            .or_else(|| probe_duration(source))
            .unwrap_or_default();

        let sink =
            rodio::Sink::try_new(&self.handle).map_err(|e| MediaError::Output(e.to_string()))?;
        sink.set_speed(rate);
        sink.append(decoder.skip_duration(at));
        if paused {
            sink.pause();
        }
        self.sink = Some(sink);
        Ok(duration)
    }

    fn set_paused(&mut self, paused: bool) {
        if let Some(sink) = &self.sink {
            if paused {
                sink.pause();
            } else {
                sink.play();
            }
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn finished(&self) -> bool {
        self.sink.as_ref().map_or(true, rodio::Sink::empty)
    }
}

/// Duration by decoding and counting samples — the mp3 decoder often cannot
/// report a total up front. Generated speech files are small enough that a
/// full decode pass is acceptable.
fn probe_duration(source: &Bytes) -> Option<Duration> {
    let decoder = rodio::Decoder::new(Cursor::new(source.clone())).ok()?;
    let sample_rate = u64::from(decoder.sample_rate());
    let channels = u64::from(decoder.channels());
    if sample_rate == 0 || channels == 0 {
        return None;
    }
    let samples = decoder.count() as u64;
    Some(Duration::from_secs_f64(
        samples as f64 / (sample_rate * channels) as f64,
    ))
}

// ---------------------------------------------------------------------------
// AudioPlayer
// ---------------------------------------------------------------------------

/// State machine over a single audio source. See [`PlaybackState`] for the
/// transition diagram.
pub struct AudioPlayer {
    output: Box<dyn AudioOutput>,
    state: PlaybackState,
    source: Option<Bytes>,
    duration: Duration,
    /// Position at the moment playback last started or was repositioned.
    base_position: Duration,
    /// Set while Playing; live position = base + elapsed × rate.
    play_started: Option<Instant>,
    rate: f32,
    error: Option<String>,
}

impl AudioPlayer {
    pub fn new(output: Box<dyn AudioOutput>, rate: f32) -> Self {
        Self {
            output,
            state: PlaybackState::Empty,
            source: None,
            duration: Duration::ZERO,
            base_position: Duration::ZERO,
            play_started: None,
            rate,
            error: None,
        }
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// A new audio fetch has started; release the previous source.
    pub fn begin_loading(&mut self) {
        self.output.stop();
        self.source = None;
        self.state = PlaybackState::Loading;
        self.duration = Duration::ZERO;
        self.base_position = Duration::ZERO;
        self.play_started = None;
        self.error = None;
    }

    /// Fetched audio bytes arrived; decode and move to `Ready`, or to
    /// `Error` if the bytes are not playable.
    pub fn load(&mut self, source: Bytes) {
        // Release first: at most one live source at any time.
        self.output.stop();
        self.base_position = Duration::ZERO;
        self.play_started = None;

        match self.output.start(&source, Duration::ZERO, self.rate, true) {
            Ok(duration) => {
                self.source = Some(source);
                self.duration = duration;
                self.state = PlaybackState::Ready;
                self.error = None;
            }
            Err(e) => {
                self.source = None;
                self.duration = Duration::ZERO;
                self.state = PlaybackState::Error;
                self.error = Some(e.to_string());
            }
        }
    }

    /// The audio fetch itself failed before any bytes arrived.
    pub fn load_failed(&mut self, message: String) {
        self.source = None;
        self.state = PlaybackState::Error;
        self.error = Some(message);
    }

    /// Drop the source and return to `Empty` (a new upload clears stale
    /// playback UI).
    pub fn unload(&mut self) {
        self.output.stop();
        self.source = None;
        self.state = PlaybackState::Empty;
        self.duration = Duration::ZERO;
        self.base_position = Duration::ZERO;
        self.play_started = None;
        self.error = None;
    }

    // ── Transport ────────────────────────────────────────────────────────

    /// Flip between `Playing` and `Paused`. From `Ended`, plays again from
    /// the start. Rejected with no loaded source.
    pub fn toggle_play_pause(&mut self) -> Result<(), MediaError> {
        match self.state {
            PlaybackState::Playing => {
                self.base_position = self.position();
                self.play_started = None;
                self.output.set_paused(true);
                self.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Paused | PlaybackState::Ready => {
                self.output.set_paused(false);
                self.play_started = Some(Instant::now());
                self.state = PlaybackState::Playing;
                Ok(())
            }
            PlaybackState::Ended => self.restart(),
            _ => Err(MediaError::NoSource),
        }
    }

    /// Stop and replay from position 0.
    pub fn restart(&mut self) -> Result<(), MediaError> {
        let source = self.source.clone().ok_or(MediaError::NoSource)?;
        self.output.start(&source, Duration::ZERO, self.rate, false)?;
        self.base_position = Duration::ZERO;
        self.play_started = Some(Instant::now());
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Relocate playback to `fraction × duration`. The displayed position
    /// updates immediately whether or not audio is playing; a seek while not
    /// playing leaves the player paused at the target.
    pub fn seek(&mut self, fraction: f32) -> Result<(), MediaError> {
        let source = self.source.clone().ok_or(MediaError::NoSource)?;
        let fraction = fraction.clamp(0.0, 1.0);
        let target = Duration::from_secs_f64(self.duration.as_secs_f64() * f64::from(fraction));

        let resume = self.state == PlaybackState::Playing;
        self.output.start(&source, target, self.rate, !resume)?;
        self.base_position = target;
        if resume {
            self.play_started = Some(Instant::now());
        } else {
            self.play_started = None;
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    /// Change playback speed. While `Playing`, the live source only honours a
    /// rate from a fresh start, so the current position is captured, the
    /// source restarted at the new rate, and playback resumed there. The rate
    /// persists across loads.
    pub fn set_rate(&mut self, multiplier: f32) -> Result<(), MediaError> {
        self.rate = multiplier;
        match self.state {
            PlaybackState::Playing => {
                let position = self.position();
                let source = self.source.clone().ok_or(MediaError::NoSource)?;
                self.output.start(&source, position, self.rate, false)?;
                self.base_position = position;
                self.play_started = Some(Instant::now());
                Ok(())
            }
            PlaybackState::Ready | PlaybackState::Paused => {
                let source = self.source.clone().ok_or(MediaError::NoSource)?;
                self.output
                    .start(&source, self.base_position, self.rate, true)?;
                Ok(())
            }
            // Not loaded: the stored rate applies to the next load.
            _ => Ok(()),
        }
    }

    /// Per-frame upkeep: detect the source draining to its natural end.
    pub fn tick(&mut self) {
        if self.state == PlaybackState::Playing && self.output.finished() {
            self.state = PlaybackState::Ended;
            self.base_position = self.duration;
            self.play_started = None;
        }
    }

    // ── Observations ─────────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Load or decode error message for the player card.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current playhead position. Computed on demand; advances only while
    /// `Playing`.
    pub fn position(&self) -> Duration {
        let position = match self.play_started {
            Some(started) => {
                let advanced = started.elapsed().as_secs_f64() * f64::from(self.rate);
                self.base_position + Duration::from_secs_f64(advanced)
            }
            None => self.base_position,
        };
        position.min(self.duration)
    }

    /// Playhead as a fraction of duration in `[0, 1]`; 0 when the duration is
    /// unknown.
    pub fn fraction(&self) -> f32 {
        let total = self.duration.as_secs_f64();
        if total <= 0.0 {
            return 0.0;
        }
        (self.position().as_secs_f64() / total).clamp(0.0, 1.0) as f32
    }
}

// ---------------------------------------------------------------------------
// Download filename
// ---------------------------------------------------------------------------

/// Suggested download name: the uploaded file's name with its last extension
/// stripped, `"audio"` when nothing usable was uploaded. The server appends
/// the `.mp3` extension to whatever name it is given.
pub fn suggested_download_name(uploaded: Option<&str>) -> String {
    match uploaded.and_then(|name| name.rsplit_once('.')) {
        Some((stem, _)) if !stem.is_empty() => stem.to_owned(),
        _ => "audio".to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Document-to-speech client — egui/eframe application.
//!
//! # Architecture
//!
//! [`DocSpeechApp`] is the top-level [`eframe::App`]. It owns all UI state
//! and three channel endpoints:
//!
//! * `command_tx` — sends [`UiCommand`] to the worker task on the tokio
//!   runtime (uploads, speech requests, audio fetches, downloads).
//! * `event_rx`  — receives [`ServerEvent`] completions from the worker.
//! * `progress_rx` — receives [`ProgressEvent`]s from the push-channel
//!   listener.
//!
//! Both receivers are drained non-blockingly at the top of every frame; each
//! event maps to one state-transition handler. Progress events only touch
//! their own sink; hiding a sink and enabling downstream UI happen solely in
//! the completion handlers, so a late progress tick can never fight the
//! result.
//!
//! The window is a single scrollable column of cards mirroring the workflow:
//! upload → direct text → extracted-text preview → speech options → player.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use eframe::egui;
use tokio::sync::mpsc;

use crate::api::{ApiError, Gender, SpeechRequest, SpeechResult, UploadResult};
use crate::lang;
use crate::player::{suggested_download_name, AudioPlayer, PlaybackState};
use crate::progress::{ProgressEvent, ProgressSink, ProgressSinks};
use crate::upload::UploadCoordinator;

// ---------------------------------------------------------------------------
// Worker message types (the worker in main imports them from here).
// ---------------------------------------------------------------------------

/// Which entry point triggered a speech request. Errors and re-enabling go
/// to the mode's own control and error area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// "Generate speech" from the options card, speaking the uploaded
    /// document.
    Selection,
    /// "Speak text" from the direct-text card.
    DirectText,
}

/// Commands sent from the UI thread to the worker task.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Upload a validated document for extraction.
    Upload { path: PathBuf },
    /// Request speech synthesis.
    GenerateSpeech {
        mode: RequestMode,
        request: SpeechRequest,
    },
    /// Fetch the freshly generated audio (cache-busted).
    FetchAudio,
    /// Save the generated audio as `<filename>.mp3` in the downloads folder.
    DownloadAudio { filename: String },
}

/// Completions delivered from the worker back to the UI.
#[derive(Debug)]
pub enum ServerEvent {
    UploadFinished(Result<UploadResult, ApiError>),
    SpeechFinished {
        mode: RequestMode,
        result: Result<SpeechResult, ApiError>,
    },
    AudioFetched(Result<Bytes, ApiError>),
    DownloadFinished(Result<PathBuf, ApiError>),
}

/// Playback speeds offered by the speed selector.
const SPEED_OPTIONS: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

fn generic_error(mode: RequestMode) -> &'static str {
    match mode {
        RequestMode::Selection => "An error occurred while generating speech.",
        RequestMode::DirectText => "An error occurred while processing text.",
    }
}

// ---------------------------------------------------------------------------
// DocSpeechApp
// ---------------------------------------------------------------------------

/// eframe application — the document-to-speech client window.
pub struct DocSpeechApp {
    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<UiCommand>,
    event_rx: mpsc::Receiver<ServerEvent>,
    progress_rx: mpsc::Receiver<ProgressEvent>,

    // ── Controllers ──────────────────────────────────────────────────────
    coordinator: UploadCoordinator,
    sinks: ProgressSinks,
    player: AudioPlayer,

    // ── Upload card ──────────────────────────────────────────────────────
    upload_path: String,
    upload_error: Option<String>,

    // ── Preview card ─────────────────────────────────────────────────────
    show_preview: bool,
    preview_text: String,
    full_text_length: Option<u64>,

    // ── Speech options card ──────────────────────────────────────────────
    show_options: bool,
    selected_language: String,
    gender: Gender,
    language_badge: Option<String>,
    generate_in_flight: bool,
    generate_error: Option<String>,

    // ── Direct text card ─────────────────────────────────────────────────
    direct_text: String,
    text_in_flight: bool,
    text_error: Option<String>,

    // ── Player card ──────────────────────────────────────────────────────
    download_in_flight: bool,
    download_status: Option<String>,
}

impl DocSpeechApp {
    pub fn new(
        command_tx: mpsc::Sender<UiCommand>,
        event_rx: mpsc::Receiver<ServerEvent>,
        progress_rx: mpsc::Receiver<ProgressEvent>,
        player: AudioPlayer,
    ) -> Self {
        Self {
            command_tx,
            event_rx,
            progress_rx,
            coordinator: UploadCoordinator::new(),
            sinks: ProgressSinks::default(),
            player,
            upload_path: String::new(),
            upload_error: None,
            show_preview: false,
            preview_text: String::new(),
            full_text_length: None,
            show_options: false,
            selected_language: "en".to_owned(),
            gender: Gender::default(),
            language_badge: None,
            generate_in_flight: false,
            generate_error: None,
            direct_text: String::new(),
            text_in_flight: false,
            text_error: None,
            download_in_flight: false,
            download_status: None,
        }
    }

    fn send(&self, command: UiCommand) {
        if self.command_tx.try_send(command).is_err() {
            log::error!("worker command channel is full or closed");
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending progress events (non-blocking) into their sinks.
    fn poll_progress(&mut self) {
        while let Ok(event) = self.progress_rx.try_recv() {
            self.sinks.route(&event);
        }
    }

    /// Drain all pending worker completions (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::UploadFinished(result) => self.on_upload_finished(result),
            ServerEvent::SpeechFinished { mode, result } => {
                self.on_speech_finished(mode, result);
            }
            ServerEvent::AudioFetched(result) => match result {
                Ok(audio) => self.player.load(audio),
                Err(e) => {
                    log::error!("audio fetch failed: {e}");
                    self.player
                        .load_failed("Error loading audio file. Please try again.".to_owned());
                }
            },
            ServerEvent::DownloadFinished(result) => {
                self.download_in_flight = false;
                match result {
                    Ok(path) => {
                        self.download_status = Some(format!("Saved to {}", path.display()));
                    }
                    Err(e) => {
                        log::error!("audio download failed: {e}");
                        self.download_status = Some(format!("Download failed: {e}"));
                    }
                }
            }
        }
    }

    // ── Upload lifecycle ─────────────────────────────────────────────────

    /// Submit-start: reset and show the extraction sink, clear stale results
    /// from any prior run.
    fn start_upload(&mut self) {
        let path = self.upload_path.trim().to_owned();
        if path.is_empty() {
            self.upload_error = Some("Please choose a file to upload.".to_owned());
            return;
        }
        match self.coordinator.begin(Path::new(&path)) {
            Ok(accepted) => {
                self.sinks.extract.reset("Preparing document upload...");
                self.upload_error = None;
                self.show_preview = false;
                self.show_options = false;
                self.language_badge = None;
                self.download_status = None;
                self.player.unload();
                self.send(UiCommand::Upload { path: accepted });
            }
            Err(e) => self.upload_error = Some(e.to_string()),
        }
    }

    fn on_upload_finished(&mut self, result: Result<UploadResult, ApiError>) {
        self.sinks.extract.hide();
        match result {
            Ok(upload) => {
                self.coordinator.finish_success();
                self.preview_text = upload.text;
                self.full_text_length = upload.full_text_length;
                self.show_preview = true;
                if let Some(code) = upload.language {
                    // Only adopt languages the selector actually offers; the
                    // badge shows the matching option label.
                    if lang::is_selectable(&code) {
                        self.language_badge = Some(lang::display_name(&code).to_owned());
                        self.selected_language = code;
                    }
                }
                self.show_options = true;
            }
            Err(e) => {
                self.coordinator.finish_error();
                self.upload_error = Some(e.to_string());
            }
        }
    }

    // ── Speech requests ──────────────────────────────────────────────────

    fn start_generate(&mut self) {
        if self.generate_in_flight {
            return;
        }
        self.sinks.generate.reset("Initializing speech generation...");
        self.generate_error = None;
        self.generate_in_flight = true;
        self.send(UiCommand::GenerateSpeech {
            mode: RequestMode::Selection,
            request: SpeechRequest::Selection {
                language: self.selected_language.clone(),
                gender: self.gender,
            },
        });
    }

    fn start_direct_text(&mut self) {
        if self.text_in_flight {
            return;
        }
        let text = self.direct_text.trim().to_owned();
        if text.is_empty() {
            // Local validation — never contacts the server.
            self.text_error = Some("Please enter some text to convert to speech.".to_owned());
            return;
        }
        self.text_error = None;
        self.sinks.generate.reset("Analyzing text input...");
        self.preview_text = text.clone();
        self.full_text_length = None;
        self.show_preview = true;
        self.show_options = true;
        self.text_in_flight = true;
        self.send(UiCommand::GenerateSpeech {
            mode: RequestMode::DirectText,
            request: SpeechRequest::Text { input_text: text },
        });
    }

    fn on_speech_finished(&mut self, mode: RequestMode, result: Result<SpeechResult, ApiError>) {
        // Whatever happened, the progress UI comes down and the trigger
        // control comes back. Both are idempotent.
        self.sinks.generate.hide();
        match mode {
            RequestMode::Selection => self.generate_in_flight = false,
            RequestMode::DirectText => self.text_in_flight = false,
        }

        match result {
            Ok(result) if result.success => {
                if mode == RequestMode::DirectText {
                    if let Some(code) = &result.detected_language {
                        self.language_badge = Some(lang::display_name(code).to_owned());
                        if lang::is_selectable(code) {
                            self.selected_language = code.clone();
                        }
                    }
                }
                self.player.begin_loading();
                self.send(UiCommand::FetchAudio);
            }
            Ok(result) => {
                let message = result
                    .error
                    .unwrap_or_else(|| generic_error(mode).to_owned());
                self.set_mode_error(mode, message);
            }
            Err(ApiError::Application(message)) => self.set_mode_error(mode, message),
            Err(e) => {
                log::error!("speech request failed: {e}");
                self.set_mode_error(mode, generic_error(mode).to_owned());
            }
        }
    }

    fn set_mode_error(&mut self, mode: RequestMode, message: String) {
        match mode {
            RequestMode::Selection => self.generate_error = Some(message),
            RequestMode::DirectText => self.text_error = Some(message),
        }
    }

    // ── Download ─────────────────────────────────────────────────────────

    fn start_download(&mut self) {
        if self.download_in_flight || !self.player.state().is_loaded() {
            return;
        }
        let filename = suggested_download_name(self.coordinator.file_name());
        self.download_in_flight = true;
        self.download_status = None;
        self.send(UiCommand::DownloadAudio { filename });
    }

    // ── Card renderers ───────────────────────────────────────────────────

    fn draw_sink(ui: &mut egui::Ui, sink: &ProgressSink) {
        if !sink.visible {
            return;
        }
        ui.add_space(4.0);
        ui.label(&sink.message);
        ui.add(
            egui::ProgressBar::new(sink.fraction()).text(format!("{}%", sink.percentage)),
        );
    }

    fn draw_error(ui: &mut egui::Ui, error: &Option<String>) {
        if let Some(message) = error {
            ui.add_space(2.0);
            ui.colored_label(egui::Color32::from_rgb(220, 80, 80), message);
        }
    }

    fn draw_upload_card(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.heading("Upload a document");
            ui.label("pdf, jpg, jpeg, png or txt — up to 10 MB");
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.upload_path)
                        .hint_text("/path/to/document.pdf")
                        .desired_width(ui.available_width() - 80.0),
                );
                let upload = ui.add_enabled(
                    !self.coordinator.in_flight(),
                    egui::Button::new("Upload"),
                );
                if upload.clicked() {
                    self.start_upload();
                }
            });
            Self::draw_error(ui, &self.upload_error);
            Self::draw_sink(ui, &self.sinks.extract);
        });
    }

    fn draw_text_card(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.heading("Or type text directly");
            ui.add(
                egui::TextEdit::multiline(&mut self.direct_text)
                    .hint_text("Type or paste text to convert to speech")
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
            let speak = ui.add_enabled(!self.text_in_flight, egui::Button::new("Speak text"));
            if speak.clicked() {
                self.start_direct_text();
            }
            Self::draw_error(ui, &self.text_error);
        });
    }

    fn draw_preview_card(&mut self, ui: &mut egui::Ui) {
        if !self.show_preview {
            return;
        }
        ui.group(|ui| {
            ui.heading("Extracted text");
            egui::ScrollArea::vertical()
                .id_salt("preview")
                .max_height(140.0)
                .show(ui, |ui| {
                    ui.label(&self.preview_text);
                });
            if let Some(total) = self.full_text_length {
                if total as usize > self.preview_text.len() {
                    ui.weak(format!("Preview — full document is {total} characters."));
                }
            }
        });
    }

    fn draw_options_card(&mut self, ui: &mut egui::Ui) {
        if !self.show_options {
            return;
        }
        ui.group(|ui| {
            ui.heading("Speech options");

            ui.horizontal(|ui| {
                ui.label("Language:");
                egui::ComboBox::from_id_salt("language")
                    .selected_text(lang::display_name(&self.selected_language).to_owned())
                    .show_ui(ui, |ui| {
                        for (code, name) in lang::LANGUAGES {
                            ui.selectable_value(
                                &mut self.selected_language,
                                code.to_owned(),
                                name,
                            );
                        }
                    });
                if let Some(badge) = &self.language_badge {
                    ui.weak(format!("detected: {badge}"));
                }
            });

            ui.horizontal(|ui| {
                ui.label("Voice:");
                for option in [Gender::Female, Gender::Male] {
                    ui.radio_value(&mut self.gender, option, option.label());
                }
            });

            let generate = ui.add_enabled(
                !self.generate_in_flight,
                egui::Button::new("Generate speech"),
            );
            if generate.clicked() {
                self.start_generate();
            }
            Self::draw_error(ui, &self.generate_error);
            Self::draw_sink(ui, &self.sinks.generate);
        });
    }

    fn draw_player_card(&mut self, ui: &mut egui::Ui) {
        let state = self.player.state();
        if matches!(state, PlaybackState::Empty | PlaybackState::Loading) {
            return;
        }
        ui.group(|ui| {
            ui.heading("Audio player");

            if state == PlaybackState::Error {
                let message = self
                    .player
                    .error_message()
                    .unwrap_or("Error loading audio file. Please try again.")
                    .to_owned();
                Self::draw_error(ui, &Some(message));
                return;
            }

            ui.horizontal(|ui| {
                let play_label = if state.is_playing() { "Pause" } else { "Play" };
                if ui.button(play_label).clicked() {
                    if let Err(e) = self.player.toggle_play_pause() {
                        log::warn!("toggle rejected: {e}");
                    }
                }
                if ui.button("Restart").clicked() {
                    if let Err(e) = self.player.restart() {
                        log::warn!("restart rejected: {e}");
                    }
                }
                let download = ui.add_enabled(
                    !self.download_in_flight,
                    egui::Button::new("Download mp3"),
                );
                if download.clicked() {
                    self.start_download();
                }
                ui.weak(state.label());
            });

            // Seek bar + time labels. The slider reflects the live playhead;
            // dragging it relocates playback immediately.
            let mut fraction = self.player.fraction();
            let response = ui.add(
                egui::Slider::new(&mut fraction, 0.0..=1.0)
                    .show_value(false)
                    .trailing_fill(true),
            );
            if response.changed() {
                if let Err(e) = self.player.seek(fraction) {
                    log::warn!("seek rejected: {e}");
                }
            }
            ui.horizontal(|ui| {
                ui.label(crate::player::format_time(
                    self.player.position().as_secs_f64(),
                ));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(crate::player::format_time(
                        self.player.duration().as_secs_f64(),
                    ));
                });
            });

            ui.horizontal(|ui| {
                ui.label("Speed:");
                let mut rate = self.player.rate();
                egui::ComboBox::from_id_salt("speed")
                    .selected_text(format!("{rate:.2}x"))
                    .show_ui(ui, |ui| {
                        for option in SPEED_OPTIONS {
                            ui.selectable_value(&mut rate, option, format!("{option:.2}x"));
                        }
                    });
                if (rate - self.player.rate()).abs() > f32::EPSILON {
                    if let Err(e) = self.player.set_rate(rate) {
                        log::warn!("rate change rejected: {e}");
                    }
                }
            });

            if let Some(status) = &self.download_status {
                ui.weak(status);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for DocSpeechApp {
    /// Called every frame by eframe. Polls channels, advances the player,
    /// then renders the card column.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_progress();
        self.poll_events();
        self.player.tick();

        // Repaint while anything is animated or outstanding: the playhead
        // during playback, progress bars while a request is in flight.
        if self.player.state().is_playing() {
            ctx.request_repaint_after(std::time::Duration::from_millis(33));
        } else if self.coordinator.in_flight()
            || self.generate_in_flight
            || self.text_in_flight
            || self.download_in_flight
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(4.0);
                self.draw_upload_card(ui);
                ui.add_space(8.0);
                self.draw_text_card(ui);
                ui.add_space(8.0);
                self.draw_preview_card(ui);
                ui.add_space(8.0);
                self.draw_options_card(ui);
                ui.add_space(8.0);
                self.draw_player_card(ui);
            });
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Application entry point — DocSpeech.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the HTTP API client ([`HttpSpeechApi`]) from config.
//! 5. Create channels (`command`, `event`, `progress`).
//! 6. Spawn the request worker and the progress listener on the runtime.
//! 7. Open the audio output device (degrade gracefully if absent).
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use docspeech::{
    api::{ApiError, HttpSpeechApi, SpeechApi},
    app::{DocSpeechApp, ServerEvent, UiCommand},
    config::{AppConfig, AppPaths},
    player::{AudioOutput, AudioPlayer, MediaError, RodioOutput},
    progress::run_progress_listener,
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Request worker
// ---------------------------------------------------------------------------

/// Runs inside the tokio runtime. Executes one [`UiCommand`] at a time and
/// emits a [`ServerEvent`] completion for each.
async fn run_worker(
    api: Arc<dyn SpeechApi>,
    download_dir: PathBuf,
    mut command_rx: mpsc::Receiver<UiCommand>,
    event_tx: mpsc::Sender<ServerEvent>,
) {
    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            UiCommand::Upload { path } => {
                let result = api.upload(&path).await;
                let _ = event_tx.send(ServerEvent::UploadFinished(result)).await;
            }

            UiCommand::GenerateSpeech { mode, request } => {
                let result = api.generate_speech(&request).await;
                let _ = event_tx
                    .send(ServerEvent::SpeechFinished { mode, result })
                    .await;
            }

            UiCommand::FetchAudio => {
                let result = api.fetch_audio().await;
                let _ = event_tx.send(ServerEvent::AudioFetched(result)).await;
            }

            UiCommand::DownloadAudio { filename } => {
                let result = save_audio(api.as_ref(), &download_dir, &filename).await;
                let _ = event_tx.send(ServerEvent::DownloadFinished(result)).await;
            }
        }
    }
}

/// Fetch the current audio from the server and write it to the downloads
/// directory as `<filename>.mp3`.
async fn save_audio(
    api: &dyn SpeechApi,
    download_dir: &std::path::Path,
    filename: &str,
) -> Result<PathBuf, ApiError> {
    let audio = api.download_audio(filename).await?;
    let target = download_dir.join(format!("{filename}.mp3"));

    tokio::fs::create_dir_all(download_dir)
        .await
        .map_err(|e| ApiError::File(e.to_string()))?;
    tokio::fs::write(&target, &audio)
        .await
        .map_err(|e| ApiError::File(e.to_string()))?;

    Ok(target)
}

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 480.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("DocSpeech starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads — requests + progress listener)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. API client
    let api: Arc<dyn SpeechApi> = Arc::new(HttpSpeechApi::from_config(&config.server));

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<UiCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(32);
    let (progress_tx, progress_rx) = mpsc::channel(32);

    // 6a. Request worker
    let download_dir = config
        .playback
        .download_dir
        .clone()
        .unwrap_or_else(AppPaths::downloads_dir);
    rt.spawn(run_worker(
        Arc::clone(&api),
        download_dir,
        command_rx,
        event_tx,
    ));

    // 6b. Progress listener. Uses its own client: the push-channel stream is
    //     long-lived, so the request timeout must not apply to it.
    let listener_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client");
    rt.spawn(run_progress_listener(
        listener_client,
        config.server.base_url.clone(),
        progress_tx,
    ));

    // 7. Audio output — degrade gracefully when no device is present so the
    //    app still launches (upload/preview keep working, playback errors).
    let output: Box<dyn AudioOutput> = match RodioOutput::new() {
        Ok(output) => Box::new(output),
        Err(e) => {
            log::warn!("Audio output unavailable: {e}. Playback will return an error.");
            Box::new(SilentOutput)
        }
    };
    let player = AudioPlayer::new(output, config.playback.default_rate);

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = DocSpeechApp::new(command_tx, event_rx, progress_rx, player);
    let options = native_options(&config);

    eframe::run_native("DocSpeech", options, Box::new(move |_cc| Ok(Box::new(app))))
}

// ---------------------------------------------------------------------------
// SilentOutput — fallback AudioOutput when no device is available
// ---------------------------------------------------------------------------

struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn start(
        &mut self,
        _source: &bytes::Bytes,
        _at: Duration,
        _rate: f32,
        _paused: bool,
    ) -> Result<Duration, MediaError> {
        Err(MediaError::Output(
            "no audio output device available".into(),
        ))
    }

    fn set_paused(&mut self, _paused: bool) {}

    fn stop(&mut self) {}

    fn finished(&self) -> bool {
        true
    }
}

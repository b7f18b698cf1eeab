//! Application entry point — Interview Coach.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the chat backend ([`ApiChatBackend`]) from config and
//!    initialise the interview session for the configured role.
//! 5. Build the speech engine over a [`TypedRecognizer`] (stdin lines stand
//!    in for dictation) and start listening.
//! 6. Start system-audio capture when the host supports it.
//! 7. Run the frame loop — poll speech events, analyse one capture frame,
//!    forward finalized questions to the coordinator — until the speech
//!    stream ends (Ctrl-D).

use std::sync::Arc;
use std::time::{Duration, Instant};

use interview_coach::{
    capture::{CaptureEngine, CpalLoopbackSource, SpeechActivityDetector},
    chat::{ApiChatBackend, ChatBackend},
    config::AppConfig,
    interview::InterviewCoordinator,
    speech::{event_channel, SpeechEngine, TypedRecognizer},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Interview Coach starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (chat requests only — the engines are synchronous)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    // 4. Chat backend + interview session
    let backend: Arc<dyn ChatBackend> = Arc::new(ApiChatBackend::from_config(&config.chat));
    let mut coordinator = InterviewCoordinator::new(backend);

    rt.block_on(coordinator.initialize(&config.role));
    if let Some(err) = coordinator.error() {
        log::error!("{err}");
    }
    if let Some(entry) = coordinator.history().last() {
        println!("[{}]\n{}\n", entry.question, entry.answer);
    }

    // 5. Speech engine — stdin lines play the dictation stream
    let (event_tx, event_rx) = event_channel();
    let recognizer = TypedRecognizer::new(event_tx);
    let mut speech = SpeechEngine::new(Box::new(recognizer), event_rx, config.speech.clone());

    let (question_tx, question_rx) = std::sync::mpsc::channel::<String>();
    speech.set_on_final_transcript(Box::new(move |text| {
        let _ = question_tx.send(text.to_string());
    }));

    speech.start_listening();
    if let Some(err) = speech.error() {
        log::error!("{err}");
    }

    // 6. System audio capture (best effort — the interview works without it)
    let mut capture = CaptureEngine::new(
        Box::new(CpalLoopbackSource::new()),
        config.capture.clone(),
    );
    let mut detector = SpeechActivityDetector::new(config.capture.detection_threshold);

    if capture.supports_audio_capture() {
        capture.start_capturing();
        if let Some(err) = capture.error() {
            log::warn!("{err}");
        }
    } else {
        log::warn!("System audio capture is not supported on this host.");
    }

    println!("Ask an interview question and press Enter (Ctrl-D to quit).");

    // 7. Frame loop
    loop {
        speech.poll_events();

        if capture.is_capturing() && capture.on_frame() {
            if let Some(phrase) = detector.poll(capture.audio_level(), Instant::now()) {
                log::info!("system audio activity: {phrase}");
            }
        }

        while let Ok(question) = question_rx.try_recv() {
            rt.block_on(coordinator.submit_question(&question));
            if let Some(err) = coordinator.error() {
                log::error!("{err}");
            }
            if let Some(entry) = coordinator.history().last() {
                println!("\nQ: {}\nA: {}\n", entry.question, entry.answer);
            }
        }

        if !speech.is_listening() {
            if let Some(err) = speech.error() {
                log::error!("{err}");
            }
            break;
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    capture.stop_capturing();
    log::info!("Interview Coach shutting down");
    Ok(())
}

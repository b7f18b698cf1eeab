//! Speech capture engine — continuous dictation with interim and final text.
//!
//! [`SpeechEngine`] owns one [`Recognizer`](crate::speech::Recognizer) and
//! drives the listening state machine:
//!
//! ```text
//! Idle ──start_listening()──▶ Starting ──Started event──▶ Listening
//!                                │                            │
//!                                └──start fails──▶ Idle       ├─ stop_listening() ─▶ Idle
//!                                                             ├─ Error event ──────▶ Idle
//!                                                             └─ Ended event ──────▶ Idle
//! ```
//!
//! `is_listening()` reports `true` for both `Starting` and `Listening`: the
//! flag flips optimistically before the platform confirms the stream is live,
//! so the UI reacts immediately.  During that brief window the observable
//! state runs ahead of the hardware — deliberate, not a bug.
//!
//! There is **no auto-restart**: a natural end event returns the engine to
//! idle even in continuous mode (some platforms end the stream on silence),
//! and the caller decides whether to call [`start_listening`] again.
//!
//! [`start_listening`]: SpeechEngine::start_listening

use std::sync::mpsc;

use crate::config::SpeechConfig;
use crate::speech::session::{event_channel, RecognitionEvent, Recognizer};

// ---------------------------------------------------------------------------
// ListenState
// ---------------------------------------------------------------------------

/// States of the speech capture engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    /// No session active; waiting for `start_listening()`.
    Idle,
    /// `start_listening()` issued, platform confirmation pending.
    Starting,
    /// The underlying stream confirmed it is live.
    Listening,
}

impl ListenState {
    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            ListenState::Idle => "Idle",
            ListenState::Starting => "Starting",
            ListenState::Listening => "Listening",
        }
    }
}

impl Default for ListenState {
    fn default() -> Self {
        ListenState::Idle
    }
}

// ---------------------------------------------------------------------------
// SpeechEngine
// ---------------------------------------------------------------------------

/// Callback invoked with transcript text (interim or finalized).
pub type TranscriptCallback = Box<dyn FnMut(&str) + Send>;

/// Wraps a continuous dictation stream and surfaces interim / final text.
///
/// The engine is single-threaded and cooperative: the host calls
/// [`poll_events`](Self::poll_events) on its own schedule (each UI tick) and
/// the engine drains the session's ordered event channel, updating its
/// buffers and firing the injected callbacks.
///
/// # Buffers
///
/// * **Interim** — replaced wholesale on every result event with the
///   concatenation of that event's interim pieces; never accumulates across
///   events.
/// * **Final** — append-only for the lifetime of the engine: every finalized
///   segment is trimmed and appended with a trailing space.  It is *not*
///   reset per emission, only ever replaced by a new engine instance.
pub struct SpeechEngine {
    recognizer: Option<Box<dyn Recognizer>>,
    events: mpsc::Receiver<RecognitionEvent>,
    config: SpeechConfig,
    state: ListenState,
    interim: String,
    final_transcript: String,
    error: Option<String>,
    on_final: Option<TranscriptCallback>,
    on_interim: Option<TranscriptCallback>,
}

impl SpeechEngine {
    /// Create an engine around `recognizer`, receiving its events on
    /// `events` (the receiver half of the channel the recognizer was
    /// constructed with).
    pub fn new(
        recognizer: Box<dyn Recognizer>,
        events: mpsc::Receiver<RecognitionEvent>,
        config: SpeechConfig,
    ) -> Self {
        Self::new_inner(Some(recognizer), events, config)
    }

    /// Create an engine for a host without any dictation service.
    ///
    /// `supports_speech_recognition()` reports `false` and the error field is
    /// pre-populated; `start_listening()` is a reported no-op.
    pub fn unsupported(config: SpeechConfig) -> Self {
        let (_tx, rx) = event_channel();
        let mut engine = Self::new_inner(None, rx, config);
        engine.error = Some("Speech recognition is not supported on this host.".into());
        engine
    }

    fn new_inner(
        recognizer: Option<Box<dyn Recognizer>>,
        events: mpsc::Receiver<RecognitionEvent>,
        config: SpeechConfig,
    ) -> Self {
        Self {
            recognizer,
            events,
            config,
            state: ListenState::Idle,
            interim: String::new(),
            final_transcript: String::new(),
            error: None,
            on_final: None,
            on_interim: None,
        }
    }

    /// Register the callback invoked once per result event that carries at
    /// least one finalized segment (segments are merged and trimmed first).
    pub fn set_on_final_transcript(&mut self, callback: TranscriptCallback) {
        self.on_final = Some(callback);
    }

    /// Register the callback invoked with the interim buffer on every result
    /// event (may be the empty string).
    pub fn set_on_interim_transcript(&mut self, callback: TranscriptCallback) {
        self.on_interim = Some(callback);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether a dictation service is available at all.  Capability is a
    /// static boolean, never an error.
    pub fn supports_speech_recognition(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Optimistic listening flag — `true` from the moment `start_listening()`
    /// is issued until stop / error / natural end.
    pub fn is_listening(&self) -> bool {
        matches!(self.state, ListenState::Starting | ListenState::Listening)
    }

    /// Current internal state (mostly useful for status display and tests).
    pub fn state(&self) -> ListenState {
        self.state
    }

    /// Provisional text that may still change.
    pub fn interim_transcript(&self) -> &str {
        &self.interim
    }

    /// Cumulative finalized text for the lifetime of this engine.
    pub fn final_transcript(&self) -> &str {
        &self.final_transcript
    }

    /// The most recent failure as a single human-readable string, or `None`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Begin continuous capture.
    ///
    /// Clears the interim buffer and error state, flips the listening flag
    /// optimistically, then asks the recognizer to start.  If the start call
    /// fails synchronously the engine reverts to idle and stores a start
    /// error.  Calling while already listening is a logged no-op.
    pub fn start_listening(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            log::warn!("speech: no recognizer available to start");
            self.error = Some("Recognition not initialized.".into());
            return;
        };

        if matches!(self.state, ListenState::Starting | ListenState::Listening) {
            log::warn!("speech: already listening, start ignored");
            return;
        }

        log::debug!("speech: starting recognition");
        self.interim.clear();
        self.error = None;
        // Immediate UI feedback; the Started event confirms later.
        self.state = ListenState::Starting;

        if let Err(e) = recognizer.start(self.config.continuous, &self.config.language) {
            log::error!("speech: start failed synchronously: {e}");
            self.error = Some(format!("Start Error: {e}"));
            self.state = ListenState::Idle;
        }
    }

    /// Request a graceful stop (flushes any pending final result).
    ///
    /// The state flips to idle optimistically before the platform confirms.
    /// Calling while not listening is a logged no-op.
    pub fn stop_listening(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            log::warn!("speech: no recognizer available to stop");
            return;
        };

        if !matches!(self.state, ListenState::Starting | ListenState::Listening) {
            log::warn!("speech: not listening, stop ignored");
            return;
        }

        log::debug!("speech: stopping recognition");
        self.state = ListenState::Idle;
        recognizer.stop();
    }

    /// Drain and handle every event the session has delivered since the last
    /// call.  The host invokes this once per tick.
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    // -----------------------------------------------------------------------
    // Event handling
    // -----------------------------------------------------------------------

    fn handle_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Started => {
                log::debug!("speech: recognition started");
                self.state = ListenState::Listening;
                self.error = None;
            }

            RecognitionEvent::Result {
                result_index,
                results,
            } => {
                let mut interim = String::new();
                let mut final_segment = String::new();

                // Entries before result_index are unchanged since the
                // previous event; only the tail is re-partitioned.
                for result in results.iter().skip(result_index) {
                    if result.is_final {
                        final_segment.push_str(&result.transcript);
                    } else {
                        interim.push_str(&result.transcript);
                    }
                }

                self.interim = interim;
                if let Some(cb) = self.on_interim.as_mut() {
                    cb(&self.interim);
                }

                if !final_segment.is_empty() {
                    let trimmed = final_segment.trim().to_string();
                    log::debug!("speech: final segment: {trimmed:?}");
                    self.final_transcript.push_str(&trimmed);
                    self.final_transcript.push(' ');
                    if !trimmed.is_empty() {
                        if let Some(cb) = self.on_final.as_mut() {
                            cb(&trimmed);
                        }
                    }
                }
            }

            RecognitionEvent::Error { code, message } => {
                let user_message = code.user_message(&message);
                log::error!(
                    "speech: recognition error {}: {message}",
                    code.as_str()
                );
                self.error = Some(user_message);
                // Recognition is not resumed automatically after an error.
                self.state = ListenState::Idle;
            }

            RecognitionEvent::Ended => {
                log::debug!("speech: recognition ended");
                // Fires for any reason the stream stops; the caller must
                // start again for continued capture.
                self.state = ListenState::Idle;
            }
        }
    }
}

impl Drop for SpeechEngine {
    /// Abort the underlying stream so no event is processed after the engine
    /// is discarded.
    fn drop(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::session::{
        RecognitionErrorCode, RecognitionResult, RecognizerCalls, ScriptedRecognizer,
    };
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn make_engine() -> (
        SpeechEngine,
        mpsc::Sender<RecognitionEvent>,
        Arc<RecognizerCalls>,
    ) {
        let (tx, rx) = event_channel();
        let recognizer = ScriptedRecognizer::new(tx.clone());
        let calls = recognizer.calls();
        let engine = SpeechEngine::new(Box::new(recognizer), rx, SpeechConfig::default());
        (engine, tx, calls)
    }

    /// Collects every final-transcript callback invocation.
    fn collecting_callback() -> (TranscriptCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let cb: TranscriptCallback = Box::new(move |text| {
            seen_clone.lock().unwrap().push(text.to_string());
        });
        (cb, seen)
    }

    fn result_event(
        result_index: usize,
        results: Vec<RecognitionResult>,
    ) -> RecognitionEvent {
        RecognitionEvent::Result {
            result_index,
            results,
        }
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn starts_idle_and_not_listening() {
        let (engine, _tx, _calls) = make_engine();
        assert_eq!(engine.state(), ListenState::Idle);
        assert!(!engine.is_listening());
        assert!(engine.supports_speech_recognition());
    }

    #[test]
    fn start_flips_listening_optimistically() {
        let (mut engine, _tx, calls) = make_engine();
        engine.start_listening();

        // Listening before any Started event arrives.
        assert!(engine.is_listening());
        assert_eq!(engine.state(), ListenState::Starting);
        assert_eq!(calls.started.load(Ordering::SeqCst), 1);
        assert!(engine.error().is_none());
    }

    #[test]
    fn started_event_confirms_listening() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();
        tx.send(RecognitionEvent::Started).unwrap();
        engine.poll_events();
        assert_eq!(engine.state(), ListenState::Listening);
    }

    #[test]
    fn start_while_listening_is_a_no_op() {
        let (mut engine, _tx, calls) = make_engine();
        engine.start_listening();
        engine.start_listening();
        assert_eq!(calls.started.load(Ordering::SeqCst), 1);
        assert!(engine.is_listening());
    }

    #[test]
    fn synchronous_start_failure_reverts_to_idle() {
        let (tx, rx) = event_channel();
        let recognizer = ScriptedRecognizer::failing(tx);
        let mut engine =
            SpeechEngine::new(Box::new(recognizer), rx, SpeechConfig::default());

        engine.start_listening();

        assert!(!engine.is_listening());
        assert_eq!(engine.state(), ListenState::Idle);
        let err = engine.error().expect("start error recorded");
        assert!(err.starts_with("Start Error:"), "got: {err}");
    }

    #[test]
    fn stop_flips_idle_optimistically_and_requests_graceful_stop() {
        let (mut engine, _tx, calls) = make_engine();
        engine.start_listening();
        engine.stop_listening();

        assert!(!engine.is_listening());
        assert_eq!(calls.stopped.load(Ordering::SeqCst), 1);
        // Graceful stop, not abort.
        assert_eq!(calls.aborted.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_when_not_listening_is_a_no_op() {
        let (mut engine, _tx, calls) = make_engine();
        engine.stop_listening();
        assert_eq!(calls.stopped.load(Ordering::SeqCst), 0);
        assert_eq!(engine.state(), ListenState::Idle);
    }

    #[test]
    fn natural_end_returns_to_idle_without_restart() {
        let (mut engine, tx, calls) = make_engine();
        engine.start_listening();
        tx.send(RecognitionEvent::Started).unwrap();
        tx.send(RecognitionEvent::Ended).unwrap();
        engine.poll_events();

        assert!(!engine.is_listening());
        // No implicit auto-restart, even in continuous mode.
        assert_eq!(calls.started.load(Ordering::SeqCst), 1);
    }

    /// For every sequence of start/stop the flag settles deterministically.
    #[test]
    fn listening_flag_never_left_undefined() {
        let (mut engine, tx, _calls) = make_engine();

        engine.start_listening();
        assert!(engine.is_listening());

        engine.stop_listening();
        assert!(!engine.is_listening());

        engine.start_listening();
        tx.send(RecognitionEvent::Started).unwrap();
        engine.poll_events();
        assert!(engine.is_listening());

        tx.send(RecognitionEvent::Error {
            code: RecognitionErrorCode::NoSpeech,
            message: String::new(),
        })
        .unwrap();
        engine.poll_events();
        assert!(!engine.is_listening());
    }

    // -----------------------------------------------------------------------
    // Result handling
    // -----------------------------------------------------------------------

    #[test]
    fn final_segment_fires_callback_once_with_trimmed_text() {
        let (mut engine, tx, _calls) = make_engine();
        let (cb, seen) = collecting_callback();
        engine.set_on_final_transcript(cb);
        engine.start_listening();

        tx.send(result_event(
            0,
            vec![RecognitionResult::finalized(" hello world ")],
        ))
        .unwrap();
        engine.poll_events();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["hello world"]);
        // The finalized segment no longer appears in the interim buffer.
        assert_eq!(engine.interim_transcript(), "");
        assert_eq!(engine.final_transcript(), "hello world ");
    }

    #[test]
    fn multiple_final_segments_merge_into_one_callback() {
        let (mut engine, tx, _calls) = make_engine();
        let (cb, seen) = collecting_callback();
        engine.set_on_final_transcript(cb);
        engine.start_listening();

        tx.send(result_event(
            0,
            vec![
                RecognitionResult::finalized("tell me about "),
                RecognitionResult::finalized("garbage collection"),
            ],
        ))
        .unwrap();
        engine.poll_events();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["tell me about garbage collection"]);
    }

    #[test]
    fn interim_buffer_reflects_only_latest_event() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();

        tx.send(result_event(0, vec![RecognitionResult::interim("what is")]))
            .unwrap();
        engine.poll_events();
        assert_eq!(engine.interim_transcript(), "what is");

        tx.send(result_event(
            0,
            vec![RecognitionResult::interim("what is a deadlock")],
        ))
        .unwrap();
        engine.poll_events();
        // Replacement, not accumulation.
        assert_eq!(engine.interim_transcript(), "what is a deadlock");
    }

    #[test]
    fn result_index_skips_earlier_unchanged_results() {
        let (mut engine, tx, _calls) = make_engine();
        let (cb, seen) = collecting_callback();
        engine.set_on_final_transcript(cb);
        engine.start_listening();

        // Slot 0 was finalized by an earlier event; this event's offset is 1.
        tx.send(result_event(
            1,
            vec![
                RecognitionResult::finalized("old question"),
                RecognitionResult::finalized("new question"),
            ],
        ))
        .unwrap();
        engine.poll_events();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["new question"]);
        assert_eq!(engine.final_transcript(), "new question ");
    }

    #[test]
    fn final_transcript_accumulates_across_events() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();

        tx.send(result_event(0, vec![RecognitionResult::finalized("first")]))
            .unwrap();
        tx.send(result_event(1, vec![
            RecognitionResult::finalized("first"),
            RecognitionResult::finalized("second"),
        ]))
        .unwrap();
        engine.poll_events();

        assert_eq!(engine.final_transcript(), "first second ");
    }

    #[test]
    fn interim_only_event_fires_no_final_callback() {
        let (mut engine, tx, _calls) = make_engine();
        let (cb, seen) = collecting_callback();
        engine.set_on_final_transcript(cb);
        engine.start_listening();

        tx.send(result_event(0, vec![RecognitionResult::interim("um")]))
            .unwrap();
        engine.poll_events();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn interim_callback_sees_every_update() {
        let (mut engine, tx, _calls) = make_engine();
        let (cb, seen) = collecting_callback();
        engine.set_on_interim_transcript(cb);
        engine.start_listening();

        tx.send(result_event(0, vec![RecognitionResult::interim("he")]))
            .unwrap();
        tx.send(result_event(0, vec![RecognitionResult::interim("hello")]))
            .unwrap();
        engine.poll_events();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["he", "hello"]);
    }

    // -----------------------------------------------------------------------
    // Error handling
    // -----------------------------------------------------------------------

    #[test]
    fn error_event_normalizes_message_and_idles() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();

        tx.send(RecognitionEvent::Error {
            code: RecognitionErrorCode::Network,
            message: "socket closed".into(),
        })
        .unwrap();
        engine.poll_events();

        assert!(!engine.is_listening());
        let err = engine.error().unwrap();
        assert!(err.contains("internet connection"), "got: {err}");
    }

    #[test]
    fn permission_error_maps_to_permission_message() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();

        tx.send(RecognitionEvent::Error {
            code: RecognitionErrorCode::NotAllowed,
            message: String::new(),
        })
        .unwrap();
        engine.poll_events();

        assert!(engine.error().unwrap().contains("permission denied"));
    }

    #[test]
    fn restart_clears_previous_error_and_interim() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();

        tx.send(result_event(0, vec![RecognitionResult::interim("hm")]))
            .unwrap();
        tx.send(RecognitionEvent::Error {
            code: RecognitionErrorCode::NoSpeech,
            message: String::new(),
        })
        .unwrap();
        engine.poll_events();
        assert!(engine.error().is_some());
        assert_eq!(engine.interim_transcript(), "hm");

        engine.start_listening();
        assert!(engine.error().is_none());
        assert_eq!(engine.interim_transcript(), "");
    }

    #[test]
    fn only_latest_error_is_retained() {
        let (mut engine, tx, _calls) = make_engine();
        engine.start_listening();

        tx.send(RecognitionEvent::Error {
            code: RecognitionErrorCode::Network,
            message: String::new(),
        })
        .unwrap();
        engine.poll_events();

        engine.start_listening();
        tx.send(RecognitionEvent::Error {
            code: RecognitionErrorCode::NoSpeech,
            message: String::new(),
        })
        .unwrap();
        engine.poll_events();

        assert_eq!(engine.error().unwrap(), "Speech Error: no-speech");
    }

    // -----------------------------------------------------------------------
    // Capability / teardown
    // -----------------------------------------------------------------------

    #[test]
    fn unsupported_host_reports_capability_and_error() {
        let mut engine = SpeechEngine::unsupported(SpeechConfig::default());
        assert!(!engine.supports_speech_recognition());
        assert!(engine.error().is_some());

        engine.start_listening();
        assert!(!engine.is_listening());
        assert_eq!(engine.error().unwrap(), "Recognition not initialized.");
    }

    #[test]
    fn drop_aborts_the_underlying_stream() {
        let (tx, rx) = event_channel();
        let recognizer = ScriptedRecognizer::new(tx);
        let calls = recognizer.calls();
        let engine = SpeechEngine::new(Box::new(recognizer), rx, SpeechConfig::default());

        drop(engine);
        assert_eq!(calls.aborted.load(Ordering::SeqCst), 1);
    }

    // -----------------------------------------------------------------------
    // ListenState
    // -----------------------------------------------------------------------

    #[test]
    fn listen_state_labels() {
        assert_eq!(ListenState::Idle.label(), "Idle");
        assert_eq!(ListenState::Starting.label(), "Starting");
        assert_eq!(ListenState::Listening.label(), "Listening");
    }

    #[test]
    fn default_listen_state_is_idle() {
        assert_eq!(ListenState::default(), ListenState::Idle);
    }
}

//! Recognition session primitives — the seam between the speech capture
//! engine and whatever dictation service the host provides.
//!
//! The platform's many independent handler slots (`onstart`, `onresult`,
//! `onerror`, `onend`, …) collapse into one tagged [`RecognitionEvent`] enum
//! delivered over a single ordered `std::sync::mpsc` channel per session, so
//! the engine observes events in exactly the order the platform emitted them.

use std::sync::mpsc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// RecognitionResult / RecognitionEvent
// ---------------------------------------------------------------------------

/// One entry of a result event's result list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Best-alternative transcript text for this result slot.
    pub transcript: String,
    /// `true` once the platform considers this slot complete and immutable.
    pub is_final: bool,
}

impl RecognitionResult {
    /// A provisional (still mutable) result.
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    /// A finalized (immutable) result.
    pub fn finalized(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// Everything a recognition session can report, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// The underlying stream confirmed it is live.
    Started,
    /// New or updated results.  `results` is the session's full result list;
    /// entries before `result_index` are unchanged since the previous event.
    Result {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    /// The stream failed.  The engine maps `code` to a user-facing message.
    Error {
        code: RecognitionErrorCode,
        message: String,
    },
    /// The stream stopped, for any reason (explicit stop, silence timeout,
    /// error aftermath).  Fired exactly once per session lifetime.
    Ended,
}

// ---------------------------------------------------------------------------
// RecognitionErrorCode
// ---------------------------------------------------------------------------

/// Raw error categories a dictation service can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    Aborted,
    LanguageNotSupported,
    ServiceNotAllowed,
    Other(String),
}

impl RecognitionErrorCode {
    /// Wire-level code string, matching what dictation platforms report.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::NotAllowed => "not-allowed",
            Self::Network => "network",
            Self::Aborted => "aborted",
            Self::LanguageNotSupported => "language-not-supported",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::Other(code) => code,
        }
    }

    /// Map a raw code (plus optional detail) to the single user-facing
    /// message stored in the engine's error field.
    ///
    /// - `network` → connectivity message
    /// - `not-allowed` / `service-not-allowed` → permission message
    /// - anything else → `Speech Error: {code}` with an optional detail suffix
    pub fn user_message(&self, detail: &str) -> String {
        match self {
            Self::Network => {
                "Speech recognition network error. Please check your internet connection."
                    .to_string()
            }
            Self::NotAllowed | Self::ServiceNotAllowed => {
                "Microphone permission denied or speech service not allowed. \
                 Please check your system settings."
                    .to_string()
            }
            other => {
                let mut msg = format!("Speech Error: {}", other.as_str());
                if !detail.is_empty() {
                    msg.push_str(" - ");
                    msg.push_str(detail);
                }
                msg
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecognizerError / Recognizer trait
// ---------------------------------------------------------------------------

/// Synchronous failures a recognizer can raise from its control operations.
#[derive(Debug, Clone, Error)]
pub enum RecognizerError {
    /// `start` was called while a session is already running.
    #[error("recognition already started")]
    AlreadyStarted,

    /// The dictation service rejected the start request outright.
    #[error("failed to start recognition: {0}")]
    StartFailed(String),
}

/// Control interface of an underlying dictation stream.
///
/// Implementations deliver [`RecognitionEvent`]s through the `mpsc::Sender`
/// handed to them at construction; the engine drains the paired receiver on
/// its host's schedule.  All three operations are best-effort and must never
/// block: `start` may fail synchronously, `stop` requests a graceful end that
/// still flushes a pending final result, `abort` tears the stream down
/// immediately without flushing.
pub trait Recognizer: Send {
    /// Begin streaming.  `continuous` keeps the stream open across
    /// utterances; `language` is a BCP-47 tag.
    fn start(&mut self, continuous: bool, language: &str) -> Result<(), RecognizerError>;

    /// Request a graceful stop (pending final results are still delivered,
    /// followed by [`RecognitionEvent::Ended`]).
    fn stop(&mut self);

    /// Tear the stream down immediately.  No further events may be sent
    /// after this returns.
    fn abort(&mut self);
}

/// Create the per-session event channel shared by a recognizer and the
/// engine that owns it.
pub fn event_channel() -> (mpsc::Sender<RecognitionEvent>, mpsc::Receiver<RecognitionEvent>) {
    mpsc::channel()
}

// ---------------------------------------------------------------------------
// ScriptedRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// Control-call counters shared between a [`ScriptedRecognizer`] and the
/// test that boxed it away.
#[cfg(test)]
#[derive(Default)]
pub struct RecognizerCalls {
    pub started: std::sync::atomic::AtomicUsize,
    pub stopped: std::sync::atomic::AtomicUsize,
    pub aborted: std::sync::atomic::AtomicUsize,
}

/// A test double whose event stream is scripted by the test body.
///
/// Records control calls so tests can assert on the engine's interaction
/// with the platform, and optionally fails `start` synchronously.
#[cfg(test)]
pub struct ScriptedRecognizer {
    events: mpsc::Sender<RecognitionEvent>,
    fail_start: bool,
    calls: std::sync::Arc<RecognizerCalls>,
}

#[cfg(test)]
impl ScriptedRecognizer {
    pub fn new(events: mpsc::Sender<RecognitionEvent>) -> Self {
        Self {
            events,
            fail_start: false,
            calls: std::sync::Arc::new(RecognizerCalls::default()),
        }
    }

    /// Make every subsequent `start` call fail synchronously.
    pub fn failing(events: mpsc::Sender<RecognitionEvent>) -> Self {
        let mut rec = Self::new(events);
        rec.fail_start = true;
        rec
    }

    /// Handle to the call counters, valid after the recognizer is boxed.
    pub fn calls(&self) -> std::sync::Arc<RecognizerCalls> {
        std::sync::Arc::clone(&self.calls)
    }

    /// Inject a platform event as if the service emitted it.
    pub fn emit(&self, event: RecognitionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
impl Recognizer for ScriptedRecognizer {
    fn start(&mut self, _continuous: bool, _language: &str) -> Result<(), RecognizerError> {
        use std::sync::atomic::Ordering;
        if self.fail_start {
            return Err(RecognizerError::StartFailed("device busy".into()));
        }
        self.calls.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.stopped.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn abort(&mut self) {
        self.calls.aborted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_code_maps_to_connectivity_message() {
        let msg = RecognitionErrorCode::Network.user_message("");
        assert!(msg.contains("internet connection"), "got: {msg}");
    }

    #[test]
    fn permission_codes_map_to_permission_message() {
        for code in [
            RecognitionErrorCode::NotAllowed,
            RecognitionErrorCode::ServiceNotAllowed,
        ] {
            let msg = code.user_message("ignored detail");
            assert!(msg.contains("permission denied"), "got: {msg}");
        }
    }

    #[test]
    fn other_codes_produce_generic_message_with_code() {
        let msg = RecognitionErrorCode::NoSpeech.user_message("");
        assert_eq!(msg, "Speech Error: no-speech");
    }

    #[test]
    fn detail_suffix_appended_for_generic_errors() {
        let msg = RecognitionErrorCode::AudioCapture.user_message("device unplugged");
        assert_eq!(msg, "Speech Error: audio-capture - device unplugged");
    }

    #[test]
    fn detail_ignored_for_categorized_errors() {
        let msg = RecognitionErrorCode::Network.user_message("socket reset");
        assert!(!msg.contains("socket reset"));
    }

    #[test]
    fn events_preserve_channel_order() {
        let (tx, rx) = event_channel();
        tx.send(RecognitionEvent::Started).unwrap();
        tx.send(RecognitionEvent::Ended).unwrap();

        assert_eq!(rx.recv().unwrap(), RecognitionEvent::Started);
        assert_eq!(rx.recv().unwrap(), RecognitionEvent::Ended);
    }

    /// The trait must be object-safe (the engine holds `Box<dyn Recognizer>`).
    #[test]
    fn recognizer_is_object_safe() {
        let (tx, _rx) = event_channel();
        let _: Box<dyn Recognizer> = Box::new(ScriptedRecognizer::new(tx));
    }
}

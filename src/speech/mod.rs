//! Speech capture — turns a host dictation stream into interim and final
//! transcripts with a small observable state machine.
//!
//! The module is split along the platform seam:
//! - [`session`] defines the [`Recognizer`] control trait and the
//!   [`RecognitionEvent`] stream a recognizer delivers,
//! - [`engine`] owns a boxed recognizer and folds its events into listening
//!   state, transcript buffers and callbacks,
//! - [`typed`] is a stdin-driven recognizer for hosts without a dictation
//!   service.

pub mod engine;
pub mod session;
pub mod typed;

pub use engine::{ListenState, SpeechEngine, TranscriptCallback};
pub use session::{
    event_channel, RecognitionErrorCode, RecognitionEvent, RecognitionResult, Recognizer,
    RecognizerError,
};
pub use typed::TypedRecognizer;

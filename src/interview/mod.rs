//! Interview session coordination — one chat session per role, append-only
//! Q/A transcript.

pub mod coordinator;

pub use coordinator::{InterviewCoordinator, QaEntry};

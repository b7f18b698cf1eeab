//! Interview Coach — real-time audio and speech pipeline for interview
//! practice.
//!
//! Three building blocks, each usable on its own:
//!
//! - [`speech`] — captures the user's voice through a dictation-stream seam
//!   and exposes interim and finalized transcripts,
//! - [`capture`] — captures system audio and publishes a loudness level plus
//!   a spectrum snapshot per frame,
//! - [`interview`] — turns finalized questions into chat turns against an
//!   OpenAI-compatible backend ([`chat`]) and keeps the Q/A transcript.
//!
//! Configuration for all of them lives in [`config`].

pub mod capture;
pub mod chat;
pub mod config;
pub mod interview;
pub mod speech;

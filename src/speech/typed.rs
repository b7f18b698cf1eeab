//! Typed stand-in recognizer for hosts without a dictation service.
//!
//! [`TypedRecognizer`] turns stdin lines into finalized recognition results
//! so the full engine — state machine, buffers, callbacks — can be exercised
//! end-to-end from a terminal.  One background reader thread is spawned on
//! the first start and lives for the recognizer's lifetime; start/stop only
//! toggle whether lines are forwarded, which keeps stdin owned by a single
//! thread.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use crate::speech::session::{
    RecognitionEvent, RecognitionResult, Recognizer, RecognizerError,
};

// ---------------------------------------------------------------------------
// TypedRecognizer
// ---------------------------------------------------------------------------

/// Reads stdin lines and emits each non-empty line as one finalized result.
///
/// In non-continuous mode the session ends after the first finalized result,
/// matching how platform recognizers end single-utterance sessions.
pub struct TypedRecognizer {
    events: mpsc::Sender<RecognitionEvent>,
    running: Arc<AtomicBool>,
    continuous: Arc<AtomicBool>,
    reader_spawned: bool,
}

impl TypedRecognizer {
    /// Create a recognizer that delivers events through `events`.
    pub fn new(events: mpsc::Sender<RecognitionEvent>) -> Self {
        Self {
            events,
            running: Arc::new(AtomicBool::new(false)),
            continuous: Arc::new(AtomicBool::new(true)),
            reader_spawned: false,
        }
    }

    fn spawn_reader(&mut self) {
        if self.reader_spawned {
            return;
        }
        self.reader_spawned = true;

        let events = self.events.clone();
        let running = Arc::clone(&self.running);
        let continuous = Arc::clone(&self.continuous);

        std::thread::Builder::new()
            .name("typed-recognizer".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                let mut results: Vec<RecognitionResult> = Vec::new();

                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };

                    // Lines typed while not listening are discarded.
                    if !running.load(Ordering::SeqCst) {
                        continue;
                    }
                    let text = line.trim();
                    if text.is_empty() {
                        continue;
                    }

                    results.push(RecognitionResult::finalized(text));
                    let result_index = results.len() - 1;
                    if events
                        .send(RecognitionEvent::Result {
                            result_index,
                            results: results.clone(),
                        })
                        .is_err()
                    {
                        // Engine gone; nothing left to deliver to.
                        return;
                    }

                    if !continuous.load(Ordering::SeqCst) {
                        running.store(false, Ordering::SeqCst);
                        let _ = events.send(RecognitionEvent::Ended);
                    }
                }

                // stdin closed — the stream ends naturally.
                if running.swap(false, Ordering::SeqCst) {
                    let _ = events.send(RecognitionEvent::Ended);
                }
            })
            .expect("failed to spawn typed-recognizer thread");
    }
}

impl Recognizer for TypedRecognizer {
    fn start(&mut self, continuous: bool, _language: &str) -> Result<(), RecognizerError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RecognizerError::AlreadyStarted);
        }
        self.continuous.store(continuous, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        self.spawn_reader();
        let _ = self.events.send(RecognitionEvent::Started);
        Ok(())
    }

    fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(RecognitionEvent::Ended);
        }
    }

    fn abort(&mut self) {
        // Immediate teardown: no Ended event, lines are silently dropped.
        self.running.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Interview session coordinator.
//!
//! Owns one [`ChatSession`] per selected role and an append-only Q/A history.
//! Finalized speech segments (or typed questions) become request/response
//! turns; backend failures are recorded in the history as apology entries so
//! the transcript never silently loses a question.

use std::sync::Arc;

use crate::chat::{initial_prompt, ChatBackend, ChatSession};

// ---------------------------------------------------------------------------
// QaEntry
// ---------------------------------------------------------------------------

/// One question/answer pair of the interview transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct QaEntry {
    /// Monotonically increasing per coordinator; insertion order is
    /// chronological.
    pub id: u64,
    pub question: String,
    pub answer: String,
}

// ---------------------------------------------------------------------------
// InterviewCoordinator
// ---------------------------------------------------------------------------

/// Drives the interview conversation over a shared [`ChatBackend`].
///
/// The history is append-only: entries are never edited or removed, and
/// switching roles via [`initialize`](Self::initialize) starts a fresh
/// transcript rather than mutating the old one.
pub struct InterviewCoordinator {
    backend: Arc<dyn ChatBackend>,
    session: Option<ChatSession>,
    history: Vec<QaEntry>,
    fetching: bool,
    error: Option<String>,
    next_id: u64,
}

impl InterviewCoordinator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            session: None,
            history: Vec::new(),
            fetching: false,
            error: None,
            next_id: 0,
        }
    }

    // ---- Queries -----------------------------------------------------------

    /// Q/A transcript, oldest first.
    pub fn history(&self) -> &[QaEntry] {
        &self.history
    }

    /// `true` while a backend request is in flight.
    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    /// `true` once a role session has been set up successfully.
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Latest user-facing error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ---- Operations ----------------------------------------------------------

    /// Start a fresh session for `role`.
    ///
    /// Sends the persona prompt and records the model's greeting as the
    /// first transcript entry.  On failure the transcript instead opens
    /// with a "System Error" entry and the error message is stored.
    pub async fn initialize(&mut self, role: &str) {
        self.fetching = true;
        self.error = None;
        self.history.clear();
        self.session = None;

        let mut session = ChatSession::new();
        match self.backend.send(&mut session, &initial_prompt(role)).await {
            Ok(greeting) => {
                log::info!("interview session initialized for role: {role}");
                self.session = Some(session);
                self.push_entry(format!("{role} Session Started"), greeting);
            }
            Err(e) => {
                log::error!("chat initialization failed: {e}");
                self.error = Some(format!("Chat Initialization Error: {e}"));
                self.push_entry(
                    "System Error".to_string(),
                    format!("Sorry, an error occurred during initialization: {e}"),
                );
            }
        }

        self.fetching = false;
    }

    /// Submit one interview question and append the Q/A pair to the history.
    ///
    /// A backend failure still appends an entry (with an apology as the
    /// answer) so the transcript keeps every question asked.
    pub async fn submit_question(&mut self, text: &str) {
        let question = text.trim();
        if question.is_empty() {
            self.error = Some("Cannot process an empty question.".into());
            return;
        }
        let Some(session) = self.session.as_mut() else {
            self.error = Some("Chat is not initialized. Please wait or select a role.".into());
            return;
        };

        self.fetching = true;
        self.error = None;

        match self.backend.send(session, question).await {
            Ok(answer) => {
                self.push_entry(question.to_string(), answer);
            }
            Err(e) => {
                log::error!("chat request failed: {e}");
                self.error = Some(format!("Chat Error: {e}"));
                self.push_entry(
                    question.to_string(),
                    format!("Sorry, an error occurred: {e}"),
                );
            }
        }

        self.fetching = false;
    }

    fn push_entry(&mut self, question: String, answer: String) {
        let id = self.next_id;
        self.next_id += 1;
        self.history.push(QaEntry {
            id,
            question,
            answer,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

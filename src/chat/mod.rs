//! Conversational AI backend — OpenAI-compatible chat completions plus the
//! interview persona prompt.

pub mod backend;
pub mod prompt;

pub use backend::{ApiChatBackend, ChatBackend, ChatError, ChatMessage, ChatSession};
pub use prompt::{initial_prompt, DEFAULT_ROLES};

//! Configuration — settings structs, TOML persistence, application paths.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CaptureConfig, ChatConfig, SpeechConfig};

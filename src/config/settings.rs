//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech capture engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Keep the dictation stream open across utterances instead of ending
    /// after the first finalized result.
    ///
    /// Note: even in continuous mode some platforms end the stream on
    /// prolonged silence.  The engine never restarts automatically — the
    /// caller decides whether to call `start_listening()` again.
    pub continuous: bool,
    /// BCP-47 language tag passed to the recognizer (e.g. `"en-US"`).
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            language: "en-US".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for system-audio capture and spectrum analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// FFT window size in samples.  Must be a power of two; the frequency
    /// snapshot exposed to consumers has `fft_size / 2` bins.
    pub fft_size: usize,
    /// Exponential smoothing constant in `[0, 1)` applied to successive
    /// frequency snapshots.  `0.0` disables smoothing.
    pub smoothing_time_constant: f32,
    /// Lower bound of the dB range used when normalizing bin magnitudes.
    pub min_decibels: f32,
    /// Upper bound of the dB range used when normalizing bin magnitudes.
    pub max_decibels: f32,
    /// Combined-level threshold above which the (simulated) speech activity
    /// detector reports audio content.
    pub detection_threshold: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -90.0,
            max_decibels: -10.0,
            detection_threshold: 0.15,
        }
    }
}

// ---------------------------------------------------------------------------
// ChatConfig
// ---------------------------------------------------------------------------

/// Settings for the conversational AI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible API endpoint.
    ///
    /// - Ollama default: `http://localhost:11434`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key — `None` for local providers that need no authentication.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"qwen2.5:3b"`, `"gpt-4o-mini"`).
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).  Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a chat response before timing out.
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use interview_coach::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interview role the chat session is initialized for.
    pub role: String,
    /// Speech capture engine settings.
    pub speech: SpeechConfig,
    /// System-audio capture / analysis settings.
    pub capture: CaptureConfig,
    /// Chat backend settings.
    pub chat: ChatConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            role: "Java Developer".into(),
            speech: SpeechConfig::default(),
            capture: CaptureConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

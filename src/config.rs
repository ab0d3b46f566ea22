use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DonnaError, DonnaResult};

/// Env var pointing at an explicit config file; checked before any other location.
pub const CONFIG_ENV: &str = "DONNA_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// BCP-47 tag handed to the synthesis engine.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_speech_rate")]
    pub speech_rate: f32,
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            speech_rate: default_speech_rate(),
            greeting: default_greeting(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub partial_results: bool,
    /// Pause between the end of one capture and the next start.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
    /// How long after ready-for-speech the muted streams are restored.
    #[serde(default = "default_unmute_delay_ms")]
    pub unmute_delay_ms: u64,
    /// A capture with no result or error within this window is restarted.
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
    /// Mute notification + media streams so the start tone is not captured.
    #[serde(default = "default_true")]
    pub suppress_beep: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            partial_results: true,
            restart_delay_ms: default_restart_delay_ms(),
            unmute_delay_ms: default_unmute_delay_ms(),
            capture_timeout_ms: default_capture_timeout_ms(),
            suppress_beep: true,
        }
    }
}

/// Fixed waits between task steps. None of these observe the UI; they are
/// empirical guesses at how long the foreign app needs to settle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_launch_ms")]
    pub launch_ms: u64,
    /// Cold launch of media-heavy apps (YouTube).
    #[serde(default = "default_heavy_launch_ms")]
    pub heavy_launch_ms: u64,
    #[serde(default = "default_keyboard_ms")]
    pub keyboard_ms: u64,
    #[serde(default = "default_results_ms")]
    pub results_ms: u64,
    #[serde(default = "default_chat_open_ms")]
    pub chat_open_ms: u64,
    #[serde(default = "default_send_ms")]
    pub send_ms: u64,
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
    #[serde(default = "default_back_settle_ms")]
    pub back_settle_ms: u64,
}

impl TimingConfig {
    pub fn launch(&self, heavy: bool) -> Duration {
        Duration::from_millis(if heavy { self.heavy_launch_ms } else { self.launch_ms })
    }

    pub fn keyboard(&self) -> Duration {
        Duration::from_millis(self.keyboard_ms)
    }

    pub fn results(&self) -> Duration {
        Duration::from_millis(self.results_ms)
    }

    pub fn chat_open(&self) -> Duration {
        Duration::from_millis(self.chat_open_ms)
    }

    pub fn send(&self) -> Duration {
        Duration::from_millis(self.send_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn back_settle(&self) -> Duration {
        Duration::from_millis(self.back_settle_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            launch_ms: default_launch_ms(),
            heavy_launch_ms: default_heavy_launch_ms(),
            keyboard_ms: default_keyboard_ms(),
            results_ms: default_results_ms(),
            chat_open_ms: default_chat_open_ms(),
            send_ms: default_send_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            back_settle_ms: default_back_settle_ms(),
        }
    }
}

/// Scroll stroke geometry in screen pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_swipe_x")]
    pub x: f32,
    #[serde(default = "default_swipe_from_y")]
    pub from_y: f32,
    #[serde(default = "default_swipe_to_y")]
    pub to_y: f32,
    /// Short, fast drags get dropped by the gesture pipeline; keep this slow.
    #[serde(default = "default_swipe_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_max_scrolls")]
    pub max_scrolls: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            x: default_swipe_x(),
            from_y: default_swipe_from_y(),
            to_y: default_swipe_to_y(),
            duration_ms: default_swipe_duration_ms(),
            max_scrolls: default_max_scrolls(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// When set, Stop drops every pending step instead of only resetting the
    /// session context.
    #[serde(default)]
    pub stop_cancels_pending: bool,
    /// Global-back presses allowed while looking for a hidden search control.
    #[serde(default = "default_max_backs")]
    pub max_backs: u8,
    /// Used when a message command names no text at all.
    #[serde(default = "default_message_body")]
    pub default_message_body: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stop_cancels_pending: false,
            max_backs: default_max_backs(),
            default_message_body: default_message_body(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en-IN".into()
}

fn default_speech_rate() -> f32 {
    1.0
}

fn default_greeting() -> String {
    "Donna is ready.".into()
}

fn default_restart_delay_ms() -> u64 {
    100
}

fn default_unmute_delay_ms() -> u64 {
    200
}

fn default_capture_timeout_ms() -> u64 {
    10_000
}

fn default_launch_ms() -> u64 {
    3000
}

fn default_heavy_launch_ms() -> u64 {
    4000
}

fn default_keyboard_ms() -> u64 {
    1500
}

fn default_results_ms() -> u64 {
    2000
}

fn default_chat_open_ms() -> u64 {
    2000
}

fn default_send_ms() -> u64 {
    1500
}

fn default_scroll_settle_ms() -> u64 {
    1500
}

fn default_back_settle_ms() -> u64 {
    1000
}

fn default_swipe_x() -> f32 {
    500.0
}

fn default_swipe_from_y() -> f32 {
    1800.0
}

fn default_swipe_to_y() -> f32 {
    300.0
}

fn default_swipe_duration_ms() -> u64 {
    1000
}

fn default_max_scrolls() -> u8 {
    4
}

fn default_max_backs() -> u8 {
    2
}

fn default_message_body() -> String {
    "Hello".into()
}

fn resolve_config_path() -> DonnaResult<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        let candidate = PathBuf::from(explicit);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config taken from {CONFIG_ENV}");
            return Ok(candidate);
        }
        tracing::warn!(path = %candidate.display(), "{CONFIG_ENV} points at a missing file");
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("donna").join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Ok(candidate);
        }
    }

    Err(DonnaError::Config(
        "config.toml not found via DONNA_CONFIG, next to executable, in working directory or user config dir".into(),
    ))
}

pub fn parse_config(content: &str) -> DonnaResult<AppConfig> {
    Ok(toml::from_str(content)?)
}

pub fn load_config() -> DonnaResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), language = %config.recognition.language, "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> DonnaResult<()> {
    let path = resolve_config_path()?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

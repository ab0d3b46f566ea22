pub mod agent_engine;
pub mod command;
pub mod commands;
pub mod config;
pub mod errors;
pub mod executor;
pub mod launcher;
pub mod perception;
pub mod speech;

#[cfg(test)]
mod testing;

use tokio::sync::mpsc;

pub use crate::commands::AgentHandle;

use crate::agent_engine::engine::AgentEngine;
use crate::agent_engine::event_bus::EventBus;
use crate::config::AppConfig;
use crate::launcher::{AppLauncher, AppRegistry};
use crate::perception::traits::AccessibilityBridge;
use crate::speech::beep::{AudioControl, BeepSuppressor};
use crate::speech::output::{Announcer, SpeechOutput};
use crate::speech::recognition::{RecognitionLoop, RecognitionService};

/// Everything the host platform has to provide.
pub struct Platform {
    pub bridge: Box<dyn AccessibilityBridge>,
    pub registry: Box<dyn AppRegistry>,
    pub speech: Box<dyn SpeechOutput>,
    pub recognizer: Box<dyn RecognitionService>,
    /// `None` leaves the recognizer's start tone audible.
    pub audio: Option<Box<dyn AudioControl>>,
}

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Loads `.env`, then the config file; a broken or missing file means defaults.
pub fn load_settings() -> AppConfig {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();
    match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config; using defaults");
            AppConfig::default()
        }
    }
}

/// A wired-up agent: the engine, the recognition loop and the channel
/// between them.
pub struct Agent {
    handle: AgentHandle,
    events: EventBus,
    engine: AgentEngine,
    recognition: RecognitionLoop,
    utterances: mpsc::Receiver<String>,
}

impl Agent {
    pub fn new(platform: Platform, config: AppConfig) -> Self {
        let events = EventBus::new();
        let (tx, utterances) = mpsc::channel::<String>(32);

        let mut announcer = Announcer::new(platform.speech, &config.speech, events.clone());
        if announcer.is_enabled() {
            announcer.say(&config.speech.greeting);
        }

        let recognition = RecognitionLoop::new(
            platform.recognizer,
            BeepSuppressor::new(platform.audio),
            config.recognition.clone(),
            events.clone(),
            tx.clone(),
        );
        let engine = AgentEngine::new(
            platform.bridge,
            AppLauncher::new(platform.registry),
            announcer,
            config,
            events.clone(),
        );

        Self {
            handle: AgentHandle { tx },
            events,
            engine,
            recognition,
            utterances,
        }
    }

    pub fn handle(&self) -> AgentHandle {
        self.handle.clone()
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// Drives both loops on the current task. Returns once voice capture has
    /// ended and every [`AgentHandle`] has been dropped.
    pub async fn run(self) {
        let Agent {
            handle,
            engine,
            recognition,
            utterances,
            ..
        } = self;
        drop(handle);
        tracing::info!("donna agent running");
        tokio::join!(engine.run_loop(utterances), recognition.run());
        tracing::info!("donna agent exited");
    }
}

pub async fn run(platform: Platform, config: AppConfig) {
    Agent::new(platform, config).run().await;
}

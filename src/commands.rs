//! Host-facing command surface: what a launcher activity, overlay or test
//! harness may call into a running agent.
use tokio::sync::mpsc;

use crate::config::{self, AppConfig};
use crate::errors::{DonnaError, DonnaResult};

/// Sends utterances into the agent loop. Cloning shares the same channel.
#[derive(Clone)]
pub struct AgentHandle {
    pub tx: mpsc::Sender<String>,
}

impl AgentHandle {
    /// Queue an utterance exactly as if it had been recognized.
    pub async fn submit(&self, utterance: impl Into<String>) -> DonnaResult<()> {
        let utterance = utterance.into();
        tracing::info!(utterance = %utterance, "manual utterance submitted");
        self.tx
            .send(utterance)
            .await
            .map_err(|_| DonnaError::ChannelClosed("agent loop is not running".into()))
    }

    pub async fn stop(&self) -> DonnaResult<()> {
        self.submit("stop").await
    }
}

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn get_config() -> DonnaResult<AppConfig> {
    config::load_config()
}

/// Persist settings edited by the host UI. They apply on the next start.
pub fn save_config_ui(config: &AppConfig) -> DonnaResult<()> {
    config::save_config(config)?;
    tracing::info!("config saved");
    Ok(())
}

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::agent_engine::state::TaskState;
use crate::command::types::Intent;

/// Observable happenings, for the status overlay / host UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServiceEvent {
    ListeningChanged {
        listening: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    UtteranceHeard {
        raw: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    IntentResolved {
        intent: Intent,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    TaskStateChanged {
        chain: uuid::Uuid,
        task: String,
        state: TaskState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    Spoken {
        text: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ServiceEvent {
    pub fn listening(listening: bool) -> Self {
        ServiceEvent::ListeningChanged {
            listening,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn heard(raw: &str) -> Self {
        ServiceEvent::UtteranceHeard {
            raw: raw.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn intent(intent: &Intent) -> Self {
        ServiceEvent::IntentResolved {
            intent: intent.clone(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn task_state(chain: uuid::Uuid, task: &str, state: TaskState) -> Self {
        ServiceEvent::TaskStateChanged {
            chain,
            task: task.to_string(),
            state,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn spoken(text: &str) -> Self {
        ServiceEvent::Spoken {
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Fan-out of [`ServiceEvent`]s. Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServiceEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.tx.subscribe()
    }

    /// Having no subscribers is normal; the event is simply dropped.
    pub fn publish(&self, event: ServiceEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("service event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

use serde::{Deserialize, Serialize};

use crate::command::profiles::{profile_for_label, AppProfile};

/// Foreign app the orchestrator last switched to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "app", rename_all = "snake_case")]
pub enum CurrentApp {
    #[default]
    None,
    Known(String),
}

/// Cross-utterance context. Mutated only by the orchestrator; read by the
/// interpreter to resolve follow-up commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSessionState {
    pub current_app: CurrentApp,
}

impl AppSessionState {
    pub fn known(label: impl Into<String>) -> Self {
        Self {
            current_app: CurrentApp::Known(label.into()),
        }
    }

    pub fn current_label(&self) -> Option<&str> {
        match &self.current_app {
            CurrentApp::Known(label) => Some(label),
            CurrentApp::None => None,
        }
    }

    pub fn current_profile(&self) -> Option<&'static AppProfile> {
        self.current_label().map(profile_for_label)
    }

    pub fn is_in(&self, label: &str) -> bool {
        self.current_label().is_some_and(|l| l.eq_ignore_ascii_case(label))
    }

    pub fn switch_to(&mut self, label: &str) {
        self.current_app = CurrentApp::Known(label.to_string());
    }

    pub fn reset(&mut self) {
        self.current_app = CurrentApp::None;
    }
}

/// Lifecycle of one orchestrated task chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    Launching,
    LocatingControl,
    AwaitingInput { typed: String },
    LocatingResult,
    Acting,
    Done,
    Failed { reason: String },
}

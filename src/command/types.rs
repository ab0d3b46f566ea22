use serde::{Deserialize, Serialize};

use crate::command::normalizer::normalize;

/// One recognition result, consumed once by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceContext {
    pub raw_text: String,
    pub normalized_text: String,
}

impl UtteranceContext {
    pub fn new(raw: &str) -> Self {
        Self {
            raw_text: raw.to_string(),
            normalized_text: normalize(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallRoute {
    WhatsApp,
    Dialer,
}

/// Structured meaning of a spoken command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Stop,
    NavigateBack,
    NavigateHome,
    OpenApp {
        app_name: String,
    },
    PlaceCall {
        contact_name: String,
        is_video: bool,
        route: CallRoute,
    },
    SendMessage {
        contact_name: String,
        body: String,
    },
    /// `app: None` searches whatever is in the foreground.
    SearchInApp {
        app: Option<String>,
        query: String,
    },
    Scroll,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Stop => "stop",
            Intent::NavigateBack => "navigate_back",
            Intent::NavigateHome => "navigate_home",
            Intent::OpenApp { .. } => "open_app",
            Intent::PlaceCall { .. } => "place_call",
            Intent::SendMessage { .. } => "send_message",
            Intent::SearchInApp { .. } => "search_in_app",
            Intent::Scroll => "scroll",
        }
    }
}

use crate::agent_engine::event_bus::{EventBus, ServiceEvent};
use crate::config::SpeechConfig;
use crate::errors::DonnaResult;

/// Text-to-speech collaborator.
pub trait SpeechOutput: Send {
    /// Called once at start-up; an error disables spoken feedback.
    fn initialize(&mut self, config: &SpeechConfig) -> DonnaResult<()>;

    /// Fire-and-forget. A new utterance flushes whatever is still playing
    /// instead of queueing behind it.
    fn speak(&mut self, text: &str);
}

/// Spoken feedback that degrades to log-only when synthesis is unavailable.
pub struct Announcer {
    output: Option<Box<dyn SpeechOutput>>,
    events: EventBus,
}

impl Announcer {
    pub fn new(mut output: Box<dyn SpeechOutput>, config: &SpeechConfig, events: EventBus) -> Self {
        let output = match output.initialize(config) {
            Ok(()) => {
                tracing::info!(language = %config.language, rate = config.speech_rate, "speech output ready");
                Some(output)
            }
            Err(e) => {
                tracing::warn!(error = %e, "speech output unavailable; feedback is log-only");
                None
            }
        };
        Self { output, events }
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some()
    }

    pub fn say(&mut self, text: &str) {
        tracing::info!(text, "speak");
        self.events.publish(ServiceEvent::spoken(text));
        if let Some(out) = self.output.as_mut() {
            out.speak(text);
        }
    }
}

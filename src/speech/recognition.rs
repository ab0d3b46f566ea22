use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::agent_engine::event_bus::{EventBus, ServiceEvent};
use crate::config::RecognitionConfig;
use crate::errors::DonnaResult;
use crate::speech::beep::BeepSuppressor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub language: String,
    pub partial_results: bool,
    pub max_results: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    ReadyForSpeech,
    BeginningOfSpeech,
    EndOfSpeech,
    PartialResults(Vec<String>),
    /// Finalised transcriptions, best first.
    Results(Vec<String>),
    Error(i32),
}

/// Speech-to-text collaborator. One capture per `start_listening`.
#[async_trait]
pub trait RecognitionService: Send {
    fn is_available(&self) -> bool;

    async fn start_listening(&mut self, request: &RecognitionRequest) -> DonnaResult<()>;

    /// `None` means the service dropped the capture without a terminal event.
    async fn next_event(&mut self) -> Option<RecognitionEvent>;
}

/// How one capture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEnd {
    Result,
    Error(i32),
    Timeout,
    ServiceGone,
    StartFailed,
    /// The utterance consumer is gone; the loop should exit.
    ConsumerClosed,
}

/// Keeps voice capture running: every result, error, timeout or failed start
/// is followed by a short pause and a fresh capture.
pub struct RecognitionLoop {
    service: Box<dyn RecognitionService>,
    beep: BeepSuppressor,
    config: RecognitionConfig,
    events: EventBus,
    utterances: mpsc::Sender<String>,
}

impl RecognitionLoop {
    pub fn new(
        service: Box<dyn RecognitionService>,
        beep: BeepSuppressor,
        config: RecognitionConfig,
        events: EventBus,
        utterances: mpsc::Sender<String>,
    ) -> Self {
        Self {
            service,
            beep,
            config,
            events,
            utterances,
        }
    }

    pub async fn run(mut self) {
        if !self.service.is_available() {
            tracing::warn!("speech recognition unavailable; voice capture disabled");
            return;
        }
        let restart = Duration::from_millis(self.config.restart_delay_ms);
        loop {
            let end = self.capture_once().await;
            tracing::debug!(?end, "capture ended; restarting");
            if end == CaptureEnd::ConsumerClosed {
                break;
            }
            tokio::time::sleep(restart).await;
        }
        tracing::info!("recognition loop ended");
    }

    pub async fn capture_once(&mut self) -> CaptureEnd {
        let request = RecognitionRequest {
            language: self.config.language.clone(),
            partial_results: self.config.partial_results,
            max_results: 1,
        };

        let muted = self.config.suppress_beep;
        if muted {
            self.beep.mute();
        }
        self.events.publish(ServiceEvent::listening(true));

        let end = match self.service.start_listening(&request).await {
            Ok(()) => self.await_terminal_event(muted).await,
            Err(e) => {
                tracing::warn!(error = %e, "start_listening failed");
                CaptureEnd::StartFailed
            }
        };

        // Volumes come back on every exit path, including a capture that
        // never reached ready-for-speech.
        if muted {
            self.beep.restore();
        }
        self.events.publish(ServiceEvent::listening(false));
        end
    }

    async fn await_terminal_event(&mut self, muted: bool) -> CaptureEnd {
        let deadline = Instant::now() + Duration::from_millis(self.config.capture_timeout_ms);
        let unmute_delay = Duration::from_millis(self.config.unmute_delay_ms);
        let mut unmute_at: Option<Instant> = None;

        loop {
            tokio::select! {
                event = self.service.next_event() => match event {
                    Some(RecognitionEvent::ReadyForSpeech) => {
                        if muted {
                            unmute_at = Some(Instant::now() + unmute_delay);
                        }
                    }
                    Some(RecognitionEvent::Results(matches)) => {
                        let Some(first) = matches.into_iter().next() else {
                            return CaptureEnd::Result;
                        };
                        let text = first.to_lowercase();
                        tracing::info!(text = %text, "recognized");
                        if self.utterances.send(text).await.is_err() {
                            return CaptureEnd::ConsumerClosed;
                        }
                        return CaptureEnd::Result;
                    }
                    Some(RecognitionEvent::Error(code)) => {
                        tracing::debug!(code, "recognition error");
                        return CaptureEnd::Error(code);
                    }
                    Some(other) => tracing::trace!(?other, "recognition event"),
                    None => return CaptureEnd::ServiceGone,
                },
                _ = sleep_until(unmute_at.unwrap_or(deadline)), if unmute_at.is_some() => {
                    self.beep.restore();
                    unmute_at = None;
                }
                _ = sleep_until(deadline) => {
                    tracing::debug!("capture timed out");
                    return CaptureEnd::Timeout;
                }
            }
        }
    }
}

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::agent_engine::event_bus::{EventBus, ServiceEvent};
use crate::agent_engine::scheduler::Scheduler;
use crate::agent_engine::state::{AppSessionState, TaskState};
use crate::agent_engine::tasks::{advance, Goal, ScheduledStep, StepContext, TaskChain, TaskPlan, Transition};
use crate::command::interpreter::interpret;
use crate::command::types::{Intent, UtteranceContext};
use crate::config::AppConfig;
use crate::errors::DonnaError;
use crate::executor::gesture::scroll_down;
use crate::executor::input::ActionExecutor;
use crate::launcher::AppLauncher;
use crate::perception::traits::AccessibilityBridge;
use crate::speech::output::Announcer;

/// Owns the session context and every pending chain step. All tree access
/// and platform actions happen on the task that drives [`AgentEngine::run_loop`].
pub struct AgentEngine {
    session: AppSessionState,
    scheduler: Scheduler<ScheduledStep>,
    bridge: Box<dyn AccessibilityBridge>,
    launcher: AppLauncher,
    announcer: Announcer,
    config: AppConfig,
    events: EventBus,
}

impl AgentEngine {
    pub fn new(
        bridge: Box<dyn AccessibilityBridge>,
        launcher: AppLauncher,
        announcer: Announcer,
        config: AppConfig,
        events: EventBus,
    ) -> Self {
        Self {
            session: AppSessionState::default(),
            scheduler: Scheduler::new(),
            bridge,
            launcher,
            announcer,
            config,
            events,
        }
    }

    pub fn session(&self) -> &AppSessionState {
        &self.session
    }

    pub fn pending_steps(&self) -> usize {
        self.scheduler.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub async fn run_loop(mut self, mut utterances: mpsc::Receiver<String>) {
        tracing::info!("agent engine started");
        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                msg = utterances.recv() => match msg {
                    Some(raw) => self.handle_utterance(&raw, Instant::now()),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.run_due(Instant::now());
                }
            }
        }
        tracing::info!(dropped = self.scheduler.len(), "utterance channel closed; agent engine stopped");
    }

    pub fn handle_utterance(&mut self, raw: &str, now: Instant) {
        self.events.publish(ServiceEvent::heard(raw));
        let utterance = UtteranceContext::new(raw);
        let Some(intent) = interpret(&utterance, &self.session) else {
            tracing::debug!(raw, normalized = %utterance.normalized_text, "no intent");
            return;
        };
        tracing::info!(intent = ?intent, session = ?self.session.current_app, "intent resolved");
        self.events.publish(ServiceEvent::intent(&intent));
        self.dispatch(intent, now);
    }

    /// Runs every step whose delay has elapsed, in deadline order.
    pub fn run_due(&mut self, now: Instant) {
        while let Some(scheduled) = self.scheduler.pop_due(now) {
            self.execute(scheduled, now);
        }
    }

    fn dispatch(&mut self, intent: Intent, now: Instant) {
        match &intent {
            Intent::Stop => {
                self.session.reset();
                if self.config.orchestrator.stop_cancels_pending {
                    let dropped = self.scheduler.cancel_all();
                    tracing::info!(dropped, "stop: pending steps cancelled");
                } else if !self.scheduler.is_empty() {
                    tracing::info!(pending = self.scheduler.len(), "stop: pending steps left to run");
                }
                self.announcer.say("Okay, stopping.");
            }
            Intent::NavigateBack => ActionExecutor::new(self.bridge.as_mut()).global_back(),
            Intent::NavigateHome => {
                ActionExecutor::new(self.bridge.as_mut()).global_home();
                self.session.reset();
            }
            Intent::Scroll => {
                scroll_down(&mut ActionExecutor::new(self.bridge.as_mut()), &self.config.gesture);
            }
            Intent::OpenApp { app_name } => self.open_app(app_name),
            Intent::SendMessage { contact_name, .. } | Intent::PlaceCall { contact_name, .. }
                if contact_name.trim().is_empty() =>
            {
                tracing::debug!(intent = intent.name(), "no contact named");
                self.announcer.say("Who should I contact?");
            }
            _ => {
                let Some(plan) = TaskPlan::for_intent(&intent, &self.session, &self.config) else {
                    return;
                };
                self.start_chain(plan, now);
            }
        }
    }

    fn open_app(&mut self, app_name: &str) {
        self.announcer.say(&format!("Opening {app_name}"));
        match self.launcher.open(app_name) {
            Ok(app) => self.session.switch_to(&app.label),
            Err(DonnaError::AppNotInstalled(_)) => {
                self.announcer.say(&format!("I don't have {app_name} installed."));
            }
            Err(e) => {
                tracing::warn!(error = %e, app_name, "launch failed");
                self.announcer.say(&format!("I couldn't open {app_name}."));
            }
        }
    }

    fn start_chain(&mut self, plan: TaskPlan, now: Instant) {
        let intro = match &plan.goal {
            Goal::Message { .. } => Some(format!("Starting {} task", plan.app_name())),
            Goal::Call { contact, video: true } => Some(format!("Video calling {contact}")),
            Goal::Call { contact, .. } => Some(format!("Calling {contact}")),
            Goal::Search { .. } => plan.launch.as_ref().map(|_| format!("Opening {}", plan.app_name())),
        };
        if let Some(line) = intro {
            self.announcer.say(&line);
        }
        let step = plan.first_step();
        let chain = TaskChain::new(plan);
        tracing::info!(chain = %chain.id, task = chain.plan.task, looking_for = chain.plan.target(), "task chain started");
        self.execute(ScheduledStep { chain, step }, now);
    }

    fn execute(&mut self, scheduled: ScheduledStep, now: Instant) {
        let ScheduledStep { chain, step } = scheduled;
        self.events
            .publish(ServiceEvent::task_state(chain.id, chain.plan.task, step.state(&chain.plan)));
        tracing::info!(chain = %chain.id, step = ?step, "running step");

        let mut ctx = StepContext {
            bridge: self.bridge.as_mut(),
            launcher: &mut self.launcher,
            announcer: &mut self.announcer,
            session: &mut self.session,
            config: &self.config,
        };
        match advance(&mut ctx, &chain.plan, step) {
            Transition::Next { delay, step } => {
                tracing::debug!(chain = %chain.id, next = ?step, delay_ms = delay.as_millis() as u64, "step scheduled");
                self.scheduler.schedule(now, delay, ScheduledStep { chain, step });
            }
            Transition::Done => {
                tracing::info!(chain = %chain.id, task = chain.plan.task, "task chain done");
                self.events
                    .publish(ServiceEvent::task_state(chain.id, chain.plan.task, TaskState::Done));
            }
            Transition::Failed { message, error } => {
                tracing::warn!(chain = %chain.id, step = ?step, error = %error, "task chain failed");
                self.announcer.say(&message);
                self.events.publish(ServiceEvent::task_state(
                    chain.id,
                    chain.plan.task,
                    TaskState::Failed {
                        reason: error.to_string(),
                    },
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::SpeechConfig;
    use crate::perception::traits::GlobalAction;
    use crate::perception::types::{NodeSpec, UiTree};
    use crate::testing::{FakeBridge, FakeRegistry, Recorded, RecordingSpeech};

    struct Rig {
        engine: AgentEngine,
        bridge: FakeBridge,
        speech: RecordingSpeech,
        launched: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
        bus: EventBus,
    }

    fn rig_with(screen: UiTree, config: AppConfig) -> Rig {
        let bridge = FakeBridge::showing(screen);
        let speech = RecordingSpeech::default();
        let registry = FakeRegistry::with_labels(&["WhatsApp", "YouTube", "Phone", "Camera"]);
        let launched = registry.launched.clone();
        let bus = EventBus::new();
        let announcer = Announcer::new(Box::new(speech.clone()), &SpeechConfig::default(), bus.clone());
        let engine = AgentEngine::new(
            Box::new(bridge.clone()),
            AppLauncher::new(Box::new(registry)),
            announcer,
            config,
            bus.clone(),
        );
        Rig {
            engine,
            bridge,
            speech,
            launched,
            bus,
        }
    }

    fn rig(screen: UiTree) -> Rig {
        rig_with(screen, AppConfig::default())
    }

    fn blank() -> UiTree {
        UiTree::from_spec(NodeSpec::new())
    }

    /// Fires pending steps deadline by deadline until the queue is empty.
    fn drain(engine: &mut AgentEngine) -> Instant {
        let mut now = Instant::now();
        while let Some(due) = engine.next_deadline() {
            now = due;
            engine.run_due(now);
        }
        now
    }

    #[test]
    fn open_whatsapp_switches_session_to_installed_label() {
        let mut r = rig(blank());
        r.engine.handle_utterance("open whatsapp", Instant::now());
        assert_eq!(r.engine.session(), &AppSessionState::known("WhatsApp"));
        assert_eq!(*r.launched.lock().unwrap(), vec!["WhatsApp".to_string()]);
        assert_eq!(r.speech.lines(), vec!["Opening whatsapp".to_string()]);
    }

    #[test]
    fn open_missing_app_explains_and_keeps_session() {
        let mut r = rig(blank());
        r.engine.handle_utterance("telegram kholo", Instant::now());
        assert_eq!(r.engine.session(), &AppSessionState::default());
        assert_eq!(
            r.speech.lines().last().map(String::as_str),
            Some("I don't have telegram installed.")
        );
    }

    #[test]
    fn home_resets_session_and_presses_home() {
        let mut r = rig(blank());
        r.engine.handle_utterance("open youtube", Instant::now());
        r.engine.handle_utterance("go home", Instant::now());
        assert_eq!(r.engine.session(), &AppSessionState::default());
        assert!(r
            .bridge
            .with(|s| s.actions.contains(&Recorded::Global(GlobalAction::Home))));
    }

    #[test]
    fn scroll_and_back_act_immediately() {
        let mut r = rig(blank());
        r.engine.handle_utterance("scroll niche", Instant::now());
        r.engine.handle_utterance("wapas jao", Instant::now());
        assert_eq!(r.bridge.with(|s| s.gestures()), 1);
        assert!(r
            .bridge
            .with(|s| s.actions.last() == Some(&Recorded::Global(GlobalAction::Back))));
        assert_eq!(r.engine.pending_steps(), 0);
    }

    #[test]
    fn unmatched_utterance_is_dropped_silently() {
        let mut r = rig(blank());
        r.engine.handle_utterance("what a lovely day", Instant::now());
        assert!(r.speech.lines().is_empty());
        assert!(r.bridge.with(|s| s.actions.is_empty()));
    }

    #[test]
    fn message_chain_waits_for_launch_before_searching() {
        let inbox = UiTree::from_spec(
            NodeSpec::new()
                .handle(900)
                .child(NodeSpec::new().handle(1).label("Search").clickable()),
        );
        let mut r = rig(inbox);
        let start = Instant::now();
        r.engine.handle_utterance("whatsapp bhejo ko ramesh hello there", start);

        assert_eq!(r.engine.session(), &AppSessionState::known("WhatsApp"));
        assert_eq!(r.engine.pending_steps(), 1);
        assert_eq!(r.engine.next_deadline(), Some(start + Duration::from_millis(3000)));
        assert!(r.bridge.with(|s| s.actions.is_empty()));

        r.engine.run_due(start + Duration::from_millis(2999));
        assert!(r.bridge.with(|s| s.actions.is_empty()));

        r.engine.run_due(start + Duration::from_millis(3000));
        assert_eq!(r.bridge.with(|s| s.clicks()), vec![1]);
        assert_eq!(r.speech.lines()[0], "Starting WhatsApp task");
        assert!(r.speech.lines().contains(&"Searching for ramesh".to_string()));
    }

    #[test]
    fn failed_chain_is_spoken_and_published() {
        let mut r = rig(UiTree::from_spec(NodeSpec::new().child(NodeSpec::new().text("Home"))));
        let mut rx = r.bus.subscribe();
        r.engine.handle_utterance("call mummy", Instant::now());
        drain(&mut r.engine);

        assert_eq!(
            r.speech.lines().last().map(String::as_str),
            Some("I can't find the search button on Phone.")
        );
        let mut saw_failure = false;
        while let Ok(event) = rx.try_recv() {
            if let ServiceEvent::TaskStateChanged {
                state: TaskState::Failed { .. },
                task,
                ..
            } = event
            {
                assert_eq!(task, "place_call");
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[test]
    fn contextual_search_runs_without_relaunch() {
        let results = UiTree::from_spec(
            NodeSpec::new()
                .handle(900)
                .child(NodeSpec::new().handle(1).label("Search").clickable())
                .child(NodeSpec::new().handle(2).editable().focused())
                .child(NodeSpec::new().handle(3).text("test song").element_id("id/text").clickable()),
        );
        let mut r = rig(results);
        r.engine.handle_utterance("open youtube", Instant::now());
        r.engine.handle_utterance("lagao test song", Instant::now());
        drain(&mut r.engine);

        assert_eq!(*r.launched.lock().unwrap(), vec!["YouTube".to_string()]);
        assert_eq!(r.bridge.with(|s| s.clicks()), vec![1, 3]);
        assert_eq!(r.bridge.with(|s| s.typed()), vec!["test song"]);
    }

    #[test]
    fn stop_keeps_pending_steps_by_default() {
        let mut r = rig(blank());
        r.engine.handle_utterance("whatsapp pe papa ko msg bhejo", Instant::now());
        assert_eq!(r.engine.pending_steps(), 1);
        r.engine.handle_utterance("ruko", Instant::now());
        assert_eq!(r.engine.pending_steps(), 1);
        assert_eq!(r.engine.session(), &AppSessionState::default());
    }

    #[test]
    fn stop_can_cancel_pending_steps() {
        let mut config = AppConfig::default();
        config.orchestrator.stop_cancels_pending = true;
        let mut r = rig_with(blank(), config);
        r.engine.handle_utterance("whatsapp pe papa ko msg bhejo", Instant::now());
        r.engine.handle_utterance("stop", Instant::now());
        assert_eq!(r.engine.pending_steps(), 0);
        assert_eq!(r.speech.lines().last().map(String::as_str), Some("Okay, stopping."));
    }

    #[test]
    fn missing_contact_asks_instead_of_starting_chain() {
        let mut r = rig(blank());
        r.engine.handle_utterance("call", Instant::now());
        assert_eq!(r.engine.pending_steps(), 0);
        assert_eq!(r.speech.lines(), vec!["Who should I contact?".to_string()]);
    }

    #[test]
    fn chains_interleave_without_cancellation() {
        let mut r = rig(blank());
        let t0 = Instant::now();
        r.engine.handle_utterance("whatsapp pe papa ko msg bhejo", t0);
        r.engine.handle_utterance("call mummy", t0 + Duration::from_millis(500));
        assert_eq!(r.engine.pending_steps(), 2);
    }

    #[tokio::test]
    async fn run_loop_consumes_channel_until_closed() {
        let r = rig(blank());
        let (tx, rx) = mpsc::channel(4);
        let launched = r.launched.clone();
        let handle = tokio::spawn(r.engine.run_loop(rx));
        tx.send("open camera".to_string()).await.unwrap();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("engine loop exits when the channel closes")
            .unwrap();
        assert_eq!(*launched.lock().unwrap(), vec!["Camera".to_string()]);
    }
}

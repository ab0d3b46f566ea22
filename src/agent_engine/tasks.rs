//! Task chains: the delayed locate/act sequences behind message, call and
//! search commands.
//!
//! A chain is a plan plus a current [`Step`]. Each step takes a fresh tree
//! snapshot, performs its locate/act and returns a [`Transition`] saying what
//! runs next and after which delay. Nothing is held across the delay except
//! the plan and the step's own counters.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent_engine::state::{AppSessionState, TaskState};
use crate::command::profiles::{profile_for_label, AppProfile, DIALER, GENERIC, WHATSAPP};
use crate::command::types::{CallRoute, Intent};
use crate::config::AppConfig;
use crate::errors::DonnaError;
use crate::executor::gesture::scroll_down;
use crate::executor::locator::{LocateCriteria, Locator};
use crate::launcher::AppLauncher;
use crate::perception::traits::AccessibilityBridge;
use crate::speech::output::Announcer;

/// Element-id fragment of a search suggestion row.
const SUGGESTION_ID: &str = "id/text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "goal", rename_all = "snake_case")]
pub enum Goal {
    Message { contact: String, body: String },
    Call { contact: String, video: bool },
    Search { query: String },
}

/// What one chain is trying to do, fixed when the chain starts.
#[derive(Debug, Clone)]
pub struct TaskPlan {
    pub task: &'static str,
    pub profile: &'static AppProfile,
    /// Launcher name when the target app is not already in the foreground.
    pub launch: Option<String>,
    pub goal: Goal,
}

impl TaskPlan {
    /// Plans the chained intents; `None` for immediate ones.
    pub fn for_intent(intent: &Intent, session: &AppSessionState, config: &AppConfig) -> Option<Self> {
        match intent {
            Intent::SendMessage { contact_name, body } => {
                let body = if body.trim().is_empty() {
                    config.orchestrator.default_message_body.clone()
                } else {
                    body.clone()
                };
                Some(Self {
                    task: intent.name(),
                    profile: &WHATSAPP,
                    launch: Some(WHATSAPP.launch_name.to_string()),
                    goal: Goal::Message {
                        contact: contact_name.clone(),
                        body,
                    },
                })
            }
            Intent::PlaceCall {
                contact_name,
                is_video,
                route,
            } => {
                let profile = match route {
                    CallRoute::WhatsApp => &WHATSAPP,
                    CallRoute::Dialer => &DIALER,
                };
                Some(Self {
                    task: intent.name(),
                    profile,
                    launch: Some(profile.launch_name.to_string()),
                    goal: Goal::Call {
                        contact: contact_name.clone(),
                        video: *is_video,
                    },
                })
            }
            Intent::SearchInApp { app, query } => {
                let (profile, launch) = match app {
                    Some(label) if session.is_in(label) => (profile_for_label(label), None),
                    Some(label) => (profile_for_label(label), Some(label.clone())),
                    None => (session.current_profile().unwrap_or(&GENERIC), None),
                };
                Some(Self {
                    task: intent.name(),
                    profile,
                    launch,
                    goal: Goal::Search { query: query.clone() },
                })
            }
            _ => None,
        }
    }

    /// Contact or query the chain is looking for.
    pub fn target(&self) -> &str {
        match &self.goal {
            Goal::Message { contact, .. } | Goal::Call { contact, .. } => contact,
            Goal::Search { query } => query,
        }
    }

    pub fn app_name(&self) -> &str {
        self.launch.as_deref().unwrap_or(self.profile.launch_name)
    }

    fn app_name_or_screen(&self) -> &str {
        match self.app_name() {
            "" => "this screen",
            name => name,
        }
    }

    pub fn first_step(&self) -> Step {
        if self.launch.is_some() {
            Step::Launch
        } else {
            Step::OpenSearch
        }
    }

    fn after_launch(&self) -> Step {
        // Search-in-app never backs out of whatever the user was looking at.
        if self.profile.search_hidden_by_detail_view && !matches!(self.goal, Goal::Search { .. }) {
            Step::EnsureSearchVisible { backs: 0 }
        } else {
            Step::OpenSearch
        }
    }
}

/// A running chain. The id ties its state events together.
#[derive(Debug, Clone)]
pub struct TaskChain {
    pub id: Uuid,
    pub plan: TaskPlan,
}

impl TaskChain {
    pub fn new(plan: TaskPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Launch,
    EnsureSearchVisible { backs: u8 },
    OpenSearch,
    TypeSearch,
    PickResult { scrolls: u8 },
    TypeMessage,
    Send,
    StartCall,
}

impl Step {
    pub fn state(&self, plan: &TaskPlan) -> TaskState {
        match self {
            Step::Launch => TaskState::Launching,
            Step::EnsureSearchVisible { .. } | Step::OpenSearch => TaskState::LocatingControl,
            Step::TypeSearch => TaskState::AwaitingInput {
                typed: plan.target().to_string(),
            },
            Step::TypeMessage => TaskState::AwaitingInput {
                typed: match &plan.goal {
                    Goal::Message { body, .. } => body.clone(),
                    _ => String::new(),
                },
            },
            Step::PickResult { .. } => TaskState::LocatingResult,
            Step::Send | Step::StartCall => TaskState::Acting,
        }
    }
}

/// Continuation record held by the scheduler.
#[derive(Debug, Clone)]
pub struct ScheduledStep {
    pub chain: TaskChain,
    pub step: Step,
}

#[derive(Debug)]
pub enum Transition {
    Next { delay: Duration, step: Step },
    Done,
    /// `message` is spoken; the chain ends.
    Failed { message: String, error: DonnaError },
}

impl Transition {
    fn next(delay: Duration, step: Step) -> Self {
        Transition::Next { delay, step }
    }

    fn failed(message: impl Into<String>, error: DonnaError) -> Self {
        Transition::Failed {
            message: message.into(),
            error,
        }
    }
}

/// Everything a step may touch.
pub struct StepContext<'a> {
    pub bridge: &'a mut dyn AccessibilityBridge,
    pub launcher: &'a mut AppLauncher,
    pub announcer: &'a mut Announcer,
    pub session: &'a mut AppSessionState,
    pub config: &'a AppConfig,
}

pub fn advance(ctx: &mut StepContext<'_>, plan: &TaskPlan, step: Step) -> Transition {
    let config = ctx.config;
    let timing = &config.timing;
    match step {
        Step::Launch => {
            let name = plan.app_name();
            match ctx.launcher.open(name) {
                Ok(app) => {
                    ctx.session.switch_to(&app.label);
                    Transition::next(timing.launch(plan.profile.heavy_launch), plan.after_launch())
                }
                Err(e @ DonnaError::AppNotInstalled(_)) => {
                    Transition::failed(format!("I don't have {name} installed."), e)
                }
                Err(e) => Transition::failed(format!("I couldn't open {name}."), e),
            }
        }

        Step::EnsureSearchVisible { backs } => {
            let mut locator = Locator::new(&mut *ctx.bridge);
            if locator.is_visible(&plan.profile.search.criteria()) {
                return Transition::next(Duration::ZERO, Step::OpenSearch);
            }
            if backs >= config.orchestrator.max_backs {
                tracing::debug!(backs, "search still hidden; proceeding anyway");
                return Transition::next(Duration::ZERO, Step::OpenSearch);
            }
            if backs == 0 {
                ctx.announcer.say("Going back to find search");
            }
            locator.executor().global_back();
            Transition::next(timing.back_settle(), Step::EnsureSearchVisible { backs: backs + 1 })
        }

        Step::OpenSearch => {
            ctx.announcer.say(&format!("Searching for {}", plan.target()));
            let mut locator = Locator::new(&mut *ctx.bridge);
            if locator.locate_and_click(&plan.profile.search.criteria()) {
                Transition::next(timing.keyboard(), Step::TypeSearch)
            } else {
                Transition::failed(
                    format!("I can't find the search button on {}.", plan.app_name_or_screen()),
                    DonnaError::NotFound("search control".into()),
                )
            }
        }

        Step::TypeSearch => {
            let mut locator = Locator::new(&mut *ctx.bridge);
            if locator.type_into_editable(plan.target()) {
                Transition::next(timing.results(), Step::PickResult { scrolls: 0 })
            } else {
                Transition::failed(
                    format!("I couldn't type {}.", plan.target()),
                    DonnaError::NotFound("editable field".into()),
                )
            }
        }

        Step::PickResult { scrolls } => match &plan.goal {
            Goal::Search { query } => pick_suggestion(ctx, query),
            Goal::Message { contact, .. } | Goal::Call { contact, .. } => pick_contact(ctx, plan, contact, scrolls),
        },

        Step::TypeMessage => {
            let Goal::Message { body, .. } = &plan.goal else {
                return Transition::Done;
            };
            let mut locator = Locator::new(&mut *ctx.bridge);
            if locator.type_into_editable(body) {
                Transition::next(timing.send(), Step::Send)
            } else {
                Transition::failed(
                    "I couldn't find the message box.",
                    DonnaError::NotFound("message input".into()),
                )
            }
        }

        Step::Send => {
            let Some(send) = plan.profile.send else {
                return Transition::failed(
                    "I don't know how to send here.",
                    DonnaError::NotFound("send control".into()),
                );
            };
            let mut locator = Locator::new(&mut *ctx.bridge);
            if locator.locate_and_click(&send.criteria()) {
                Transition::Done
            } else {
                Transition::failed(
                    "I couldn't find the send button.",
                    DonnaError::NotFound("send control".into()),
                )
            }
        }

        Step::StartCall => {
            let video = matches!(plan.goal, Goal::Call { video: true, .. });
            let control = if video {
                plan.profile.video_call
            } else {
                plan.profile.voice_call
            };
            let kind = if video { "video call" } else { "call" };
            let Some(control) = control else {
                return Transition::failed(
                    format!("I can't start a {kind} from {}.", plan.app_name()),
                    DonnaError::NotFound(format!("{kind} control")),
                );
            };
            let mut locator = Locator::new(&mut *ctx.bridge);
            if locator.locate_and_click(&control.criteria()) {
                Transition::Done
            } else {
                Transition::failed(
                    format!("I couldn't find the {kind} button."),
                    DonnaError::NotFound(format!("{kind} control")),
                )
            }
        }
    }
}

/// The suggestion matching the query, else whatever the results list shows first.
fn pick_suggestion(ctx: &mut StepContext<'_>, query: &str) -> Transition {
    let mut locator = Locator::new(&mut *ctx.bridge);
    if locator.locate_and_click(&LocateCriteria::named(query).id(SUGGESTION_ID).skip_editable()) {
        return Transition::Done;
    }
    if locator.locate_first_list_item() {
        return Transition::Done;
    }
    Transition::failed(
        format!("I couldn't find any results for {query}."),
        DonnaError::NotFound("search result".into()),
    )
}

/// Scroll-and-retry: click the contact, or scroll and come back after the
/// list settles, up to `gesture.max_scrolls` times.
fn pick_contact(ctx: &mut StepContext<'_>, plan: &TaskPlan, contact: &str, scrolls: u8) -> Transition {
    let config = ctx.config;
    let mut locator = Locator::new(&mut *ctx.bridge);
    // The search box still holds the contact's name; it is never the result.
    if locator.locate_and_click(&LocateCriteria::named(contact).skip_editable()) {
        let (line, next) = match plan.goal {
            Goal::Call { .. } => (format!("Found {contact}. Calling."), Step::StartCall),
            _ => (format!("Found {contact}. Sending message."), Step::TypeMessage),
        };
        ctx.announcer.say(&line);
        return Transition::next(config.timing.chat_open(), next);
    }

    let gesture = &config.gesture;
    if scrolls >= gesture.max_scrolls {
        return Transition::failed(
            format!("I could not find {contact} even after scrolling."),
            DonnaError::NotFound(format!("contact {contact}")),
        );
    }

    scroll_down(locator.executor(), gesture);
    drop(locator);
    ctx.announcer.say("Scrolling...");
    tracing::debug!(contact, scroll = scrolls + 1, "contact not on screen; scrolled");
    Transition::next(
        config.timing.scroll_settle(),
        Step::PickResult { scrolls: scrolls + 1 },
    )
}

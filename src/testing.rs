//! Scripted fakes for the platform seams, shared by the unit tests.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::SpeechConfig;
use crate::errors::{DonnaError, DonnaResult};
use crate::launcher::{AppRegistry, InstalledApp};
use crate::perception::traits::{AccessibilityBridge, GlobalAction, Stroke};
use crate::perception::types::{NodeHandle, UiNode, UiTree};
use crate::speech::beep::{AudioControl, AudioStream};
use crate::speech::output::SpeechOutput;

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Click(u64),
    SetText(u64, String),
    Gesture(Stroke),
    Global(GlobalAction),
}

#[derive(Default)]
pub struct ScreenState {
    pub screen: Option<UiTree>,
    pub actions: Vec<Recorded>,
    /// Handles whose click the platform refuses.
    pub rejected: HashSet<u64>,
    /// Screen shown after the n-th gesture (1-based).
    pub after_gesture: HashMap<usize, UiTree>,
    /// Screen shown after a click on the handle.
    pub after_click: HashMap<u64, UiTree>,
    /// Screen shown after the n-th global back (1-based).
    pub after_back: HashMap<usize, UiTree>,
    gestures: usize,
    backs: usize,
}

impl ScreenState {
    pub fn clicks(&self) -> Vec<u64> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Recorded::Click(h) => Some(*h),
                _ => None,
            })
            .collect()
    }

    pub fn gestures(&self) -> usize {
        self.gestures
    }

    pub fn typed(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Recorded::SetText(_, t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct FakeBridge {
    pub state: Arc<Mutex<ScreenState>>,
}

impl FakeBridge {
    pub fn showing(tree: UiTree) -> Self {
        let bridge = Self::default();
        bridge.state.lock().unwrap().screen = Some(tree);
        bridge
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ScreenState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

impl AccessibilityBridge for FakeBridge {
    fn current_root(&self) -> Option<UiTree> {
        self.state.lock().unwrap().screen.clone()
    }

    fn perform_click(&mut self, node: &UiNode) -> bool {
        let mut s = self.state.lock().unwrap();
        let NodeHandle(h) = node.handle;
        if s.rejected.contains(&h) {
            return false;
        }
        s.actions.push(Recorded::Click(h));
        if let Some(next) = s.after_click.remove(&h) {
            s.screen = Some(next);
        }
        true
    }

    /// The field keeps the typed text, as a real EditText does.
    fn perform_set_text(&mut self, node: &UiNode, text: &str) -> bool {
        let mut s = self.state.lock().unwrap();
        s.actions.push(Recorded::SetText(node.handle.0, text.to_string()));
        if let Some(field) = s
            .screen
            .as_mut()
            .and_then(|tree| tree.nodes.iter_mut().find(|n| n.handle == node.handle))
        {
            field.text = Some(text.to_string());
        }
        true
    }

    fn dispatch_gesture(&mut self, stroke: &Stroke) -> bool {
        let mut s = self.state.lock().unwrap();
        s.actions.push(Recorded::Gesture(stroke.clone()));
        s.gestures += 1;
        let n = s.gestures;
        if let Some(next) = s.after_gesture.remove(&n) {
            s.screen = Some(next);
        }
        true
    }

    fn perform_global_action(&mut self, action: GlobalAction) {
        let mut s = self.state.lock().unwrap();
        s.actions.push(Recorded::Global(action));
        if action == GlobalAction::Back {
            s.backs += 1;
            let n = s.backs;
            if let Some(next) = s.after_back.remove(&n) {
                s.screen = Some(next);
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeRegistry {
    pub apps: Vec<InstalledApp>,
    pub launched: Arc<Mutex<Vec<String>>>,
}

impl FakeRegistry {
    pub fn with_labels(labels: &[&str]) -> Self {
        Self {
            apps: labels
                .iter()
                .map(|l| InstalledApp {
                    label: l.to_string(),
                    package: format!("pkg.{}", l.to_lowercase().replace(' ', "_")),
                })
                .collect(),
            launched: Arc::default(),
        }
    }
}

impl AppRegistry for FakeRegistry {
    fn installed_apps(&self) -> Vec<InstalledApp> {
        self.apps.clone()
    }

    fn launch(&mut self, app: &InstalledApp) -> bool {
        self.launched.lock().unwrap().push(app.label.clone());
        true
    }
}

#[derive(Clone, Default)]
pub struct RecordingSpeech {
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub fail_init: bool,
}

impl RecordingSpeech {
    pub fn lines(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl SpeechOutput for RecordingSpeech {
    fn initialize(&mut self, _config: &SpeechConfig) -> DonnaResult<()> {
        if self.fail_init {
            return Err(DonnaError::ServiceUnavailable("no tts engine".into()));
        }
        Ok(())
    }

    fn speak(&mut self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Volume levels per stream; `fail_music` makes every music write fail.
#[derive(Clone, Default)]
pub struct FakeAudio {
    pub levels: Arc<Mutex<HashMap<&'static str, u32>>>,
    pub fail_music: bool,
}

fn stream_key(stream: AudioStream) -> &'static str {
    match stream {
        AudioStream::Notification => "notification",
        AudioStream::Music => "music",
    }
}

impl FakeAudio {
    pub fn with_levels(notification: u32, music: u32) -> Self {
        let audio = Self::default();
        {
            let mut levels = audio.levels.lock().unwrap();
            levels.insert("notification", notification);
            levels.insert("music", music);
        }
        audio
    }

    pub fn level(&self, stream: AudioStream) -> u32 {
        *self.levels.lock().unwrap().get(stream_key(stream)).unwrap_or(&0)
    }
}

impl AudioControl for FakeAudio {
    fn volume(&self, stream: AudioStream) -> DonnaResult<u32> {
        Ok(self.level(stream))
    }

    fn max_volume(&self, _stream: AudioStream) -> DonnaResult<u32> {
        Ok(15)
    }

    fn set_volume(&mut self, stream: AudioStream, level: u32) -> DonnaResult<()> {
        if self.fail_music && stream == AudioStream::Music {
            return Err(DonnaError::ActionRejected("music stream is fixed".into()));
        }
        self.levels.lock().unwrap().insert(stream_key(stream), level);
        Ok(())
    }
}

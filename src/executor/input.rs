// Primitive mutations against the foreground app through the accessibility bridge.
use crate::perception::traits::{AccessibilityBridge, GlobalAction, Stroke};
use crate::perception::types::{UiNode, UiTree};

pub struct ActionExecutor<'a> {
    bridge: &'a mut dyn AccessibilityBridge,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(bridge: &'a mut dyn AccessibilityBridge) -> Self {
        Self { bridge }
    }

    /// Fresh snapshot of the foreground window.
    pub fn snapshot(&self) -> Option<UiTree> {
        self.bridge.current_root()
    }

    /// Clicking twice is harmless; the tree reflects whatever state results.
    pub fn click(&mut self, node: &UiNode) -> bool {
        let ok = self.bridge.perform_click(node);
        tracing::debug!(
            handle = node.handle.0,
            text = ?node.text,
            label = ?node.label,
            accepted = ok,
            "click"
        );
        ok
    }

    /// Fails when no editable node was resolved or the platform refuses the text.
    pub fn set_text(&mut self, node: Option<&UiNode>, value: &str) -> bool {
        let Some(node) = node else {
            tracing::debug!("set_text: no editable node");
            return false;
        };
        let ok = self.bridge.perform_set_text(node, value);
        tracing::debug!(handle = node.handle.0, chars = value.chars().count(), accepted = ok, "set_text");
        ok
    }

    pub fn swipe(&mut self, stroke: &Stroke) -> bool {
        let ok = self.bridge.dispatch_gesture(stroke);
        tracing::debug!(?stroke, dispatched = ok, "swipe");
        ok
    }

    /// One continuous drag at a fixed x.
    pub fn swipe_vertical(&mut self, x: f32, from_y: f32, to_y: f32, duration_ms: u64) -> bool {
        self.swipe(&Stroke {
            from: (x, from_y),
            to: (x, to_y),
            duration_ms,
        })
    }

    pub fn global_back(&mut self) {
        tracing::debug!("global back");
        self.bridge.perform_global_action(GlobalAction::Back);
    }

    pub fn global_home(&mut self) {
        tracing::debug!("global home");
        self.bridge.perform_global_action(GlobalAction::Home);
    }
}

use serde::{Deserialize, Serialize};

use crate::perception::types::{UiNode, UiTree};

/// System-level navigation with no parameters and no observable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalAction {
    Back,
    Home,
}

/// One continuous straight-line touch stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub duration_ms: u64,
}

/// Bridge to the platform accessibility service.
///
/// Every call to [`current_root`](Self::current_root) must return a fresh
/// snapshot; callers never hold one across a scheduled delay. All methods
/// are invoked from the single control thread.
pub trait AccessibilityBridge: Send {
    /// Snapshot of the foreground window, or `None` when no window is accessible.
    fn current_root(&self) -> Option<UiTree>;

    /// Returns whether the platform accepted the click.
    fn perform_click(&mut self, node: &UiNode) -> bool;

    /// Returns whether the platform accepted the text.
    fn perform_set_text(&mut self, node: &UiNode, text: &str) -> bool;

    /// Returns whether the gesture was dispatched (not whether it scrolled).
    fn dispatch_gesture(&mut self, stroke: &Stroke) -> bool;

    fn perform_global_action(&mut self, action: GlobalAction);
}

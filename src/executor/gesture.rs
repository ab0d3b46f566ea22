use crate::config::GestureConfig;
use crate::executor::input::ActionExecutor;

/// Full-height upward drag that scrolls list content down.
///
/// The stroke is deliberately long and slow (about one second); short or
/// fast swipes are frequently dropped by the platform gesture pipeline.
pub fn scroll_down(exec: &mut ActionExecutor<'_>, cfg: &GestureConfig) -> bool {
    exec.swipe_vertical(cfg.x, cfg.from_y, cfg.to_y, cfg.duration_ms)
}

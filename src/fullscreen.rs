//! Fullscreen toggling behind a narrow seam.
//!
//! The viewer only ever asks for a toggle; how that maps onto the window
//! system is decided here, once, at construction.

use std::sync::Arc;

use winit::monitor::VideoMode;
use winit::window::{Fullscreen, Window};

/// Single operation the viewer invokes on a double-click or double-tap.
pub trait FullscreenToggle {
    fn toggle(&mut self);
}

/// Does nothing. Useful headless and in tests.
#[derive(Debug, Default)]
pub struct NoFullscreen;

impl FullscreenToggle for NoFullscreen {
    fn toggle(&mut self) {}
}

#[derive(Debug)]
enum Strategy {
    Borderless,
    Exclusive(VideoMode),
    Unsupported,
}

/// Toggles a winit window, with the mode picked once up front.
///
/// Borderless is the default. When exclusive mode is requested the probe
/// selects the monitor's largest video mode, preferring the higher refresh
/// rate among equals, and falls back to borderless if none is reported.
pub struct WindowFullscreen {
    window: Arc<Window>,
    strategy: Strategy,
}

impl WindowFullscreen {
    pub fn new(window: Arc<Window>, prefer_exclusive: bool) -> Self {
        let strategy = match window.current_monitor() {
            None => Strategy::Unsupported,
            Some(monitor) if prefer_exclusive => monitor
                .video_modes()
                .max_by_key(|mode| {
                    let size = mode.size();
                    (
                        size.width as u64 * size.height as u64,
                        mode.refresh_rate_millihertz(),
                    )
                })
                .map(Strategy::Exclusive)
                .unwrap_or(Strategy::Borderless),
            Some(_) => Strategy::Borderless,
        };
        Self { window, strategy }
    }
}

impl FullscreenToggle for WindowFullscreen {
    fn toggle(&mut self) {
        if self.window.fullscreen().is_some() {
            self.window.set_fullscreen(None);
            return;
        }
        match &self.strategy {
            Strategy::Borderless => self.window.set_fullscreen(Some(Fullscreen::Borderless(None))),
            Strategy::Exclusive(mode) => {
                self.window.set_fullscreen(Some(Fullscreen::Exclusive(mode.clone())));
            }
            Strategy::Unsupported => log::warn!("no monitor reported; fullscreen unavailable"),
        }
    }
}

//! Pointer, touch, and wheel gestures translated into camera deltas.
//!
//! All pixel deltas are divided by the current sphere radius, so the same
//! hand motion covers the same apparent arc regardless of zoom. Deltas are
//! measured against the previous event, not the gesture start; clamping then
//! applies continuously instead of snapping once at release.

use std::time::{Duration, Instant};

use glam::Vec2;
use winit::event::TouchPhase;

use crate::camera::Camera;

/// Two primary-button presses or single-finger taps inside this window make
/// a double activation.
const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

/// Wheel deltas are much coarser than drag deltas; scale them down.
const WHEEL_ZOOM_SCALE: f32 = 0.1;

/// Gesture that the camera cannot satisfy by itself; the caller routes it
/// to the matching collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    ToggleFullscreen,
}

/// Tracks in-flight pointer and touch gestures between events.
///
/// Touch state mirrors per-finger events into a whole-gesture view: `touches`
/// holds every active finger in landing order and `last_touch_points` is the
/// snapshot taken after the previous event. When a finger lands or lifts
/// mid-gesture the snapshot length stops matching the live count for exactly
/// one move event; that event only refreshes the snapshot, so the gesture
/// resumes from coherent pairs instead of jumping.
#[derive(Debug, Default)]
pub struct GestureController {
    drag_anchor: Option<Vec2>,
    touches: Vec<(u64, Vec2)>,
    last_touch_points: Vec<Vec2>,
    last_tap: Option<Instant>,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary button pressed: starts a drag and counts toward double-click.
    pub fn pointer_down(
        &mut self,
        pos: Vec2,
        now: Instant,
        camera: &mut Camera,
    ) -> Option<GestureAction> {
        self.drag_anchor = Some(pos);
        camera.set_dragging(true);
        self.register_tap(now)
    }

    /// Pointer moved while the button is down. With `zoom_modifier` held the
    /// vertical delta drives zoom; otherwise the delta pans and tilts,
    /// inverted so the image follows the pointer.
    pub fn pointer_move(
        &mut self,
        pos: Vec2,
        zoom_modifier: bool,
        radius: f32,
        camera: &mut Camera,
    ) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let delta = pos - anchor;
        if zoom_modifier {
            camera.set_ptz(camera.pan(), camera.tilt(), camera.zoom() + delta.y / radius);
        } else {
            camera.set_ptz(
                camera.pan() - delta.x / radius,
                camera.tilt() - delta.y / radius,
                camera.zoom(),
            );
        }
        self.drag_anchor = Some(pos);
    }

    pub fn pointer_up(&mut self, camera: &mut Camera) {
        self.drag_anchor = None;
        camera.set_dragging(false);
    }

    /// Feeds one per-finger touch event through the gesture model.
    ///
    /// One finger orbits like a pointer drag; two fingers zoom by the change
    /// in their separation. Only the first finger landing starts the gesture
    /// or counts as a tap, and only the last finger lifting ends it.
    pub fn touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        pos: Vec2,
        now: Instant,
        radius: f32,
        camera: &mut Camera,
    ) -> Option<GestureAction> {
        match phase {
            TouchPhase::Started => {
                let first = self.touches.is_empty();
                self.upsert(id, pos);
                if first {
                    camera.set_dragging(true);
                    self.last_touch_points = vec![pos];
                    return self.register_tap(now);
                }
                None
            }
            TouchPhase::Moved => {
                if self.touches.is_empty() {
                    return None;
                }
                self.upsert(id, pos);
                if self.touches.len() == 1 && self.last_touch_points.len() == 1 {
                    let prev = self.last_touch_points[0];
                    let delta = self.touches[0].1 - prev;
                    camera.set_ptz(
                        camera.pan() - delta.x / radius,
                        camera.tilt() - delta.y / radius,
                        camera.zoom(),
                    );
                } else if self.touches.len() == 2 && self.last_touch_points.len() == 2 {
                    let spread = self.touches[0].1.distance(self.touches[1].1);
                    let last_spread = self.last_touch_points[0].distance(self.last_touch_points[1]);
                    camera.set_ptz(
                        camera.pan(),
                        camera.tilt(),
                        camera.zoom() + (spread - last_spread) / radius,
                    );
                }
                self.last_touch_points = self.touches.iter().map(|(_, p)| *p).collect();
                None
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.retain(|(tid, _)| *tid != id);
                if self.touches.is_empty() {
                    self.last_touch_points.clear();
                    camera.set_dragging(false);
                }
                None
            }
        }
    }

    /// Scroll wheel: vertical delta maps straight to zoom.
    pub fn wheel(&mut self, delta_y: f32, radius: f32, camera: &mut Camera) {
        camera.set_ptz(
            camera.pan(),
            camera.tilt(),
            camera.zoom() + delta_y / radius * WHEEL_ZOOM_SCALE,
        );
    }

    fn upsert(&mut self, id: u64, pos: Vec2) {
        if let Some(entry) = self.touches.iter_mut().find(|(tid, _)| *tid == id) {
            entry.1 = pos;
        } else {
            self.touches.push((id, pos));
        }
    }

    /// Records a tap and reports whether it completed a double activation.
    /// The timestamp always advances, so a triple tap fires twice.
    fn register_tap(&mut self, now: Instant) -> Option<GestureAction> {
        let fired = self
            .last_tap
            .is_some_and(|last| now.duration_since(last) < DOUBLE_TAP_WINDOW);
        self.last_tap = Some(now);
        fired.then_some(GestureAction::ToggleFullscreen)
    }
}

//! The per-frame driver: one `tick` per display frame, in a fixed order.
//!
//! Each tick advances the motion model, folds in any viewport change, and
//! rebuilds the view matrix only when camera state is dirty. The host loop
//! owns scheduling; a stopped viewer simply reports nothing to draw.

use std::time::Instant;

use glam::{Mat4, Vec2};
use winit::event::TouchPhase;

use crate::camera::{Camera, Ptz};
use crate::config::ViewerConfig;
use crate::fullscreen::FullscreenToggle;
use crate::input::{GestureAction, GestureController};
use crate::mesh::{self, SphereMesh};
use crate::transform;

/// Everything the graphics backend needs for one draw.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Model-view matrix for the unit-sphere vertices, in OpenGL clip
    /// conventions.
    pub matrix: Mat4,
    /// Vertex count for the triangle-strip draw call.
    pub vertex_count: u32,
}

/// Owns the camera, gesture state, and sphere mesh for one panorama.
pub struct Viewer {
    config: ViewerConfig,
    camera: Camera,
    gestures: GestureController,
    mesh: SphereMesh,
    viewport: (u32, u32),
    last_tick: Option<Instant>,
    running: bool,
    fullscreen: Box<dyn FullscreenToggle>,
}

impl Viewer {
    /// Builds the mesh once and starts in the running state, facing pan 0
    /// at the horizon.
    pub fn new(config: ViewerConfig, fullscreen: Box<dyn FullscreenToggle>) -> Self {
        let mesh = mesh::build_sphere(config.h_div, config.v_div);
        let camera = Camera::new(config.att);
        let viewport = (config.width, config.height);
        Self {
            config,
            camera,
            gestures: GestureController::new(),
            mesh,
            viewport,
            last_tick: None,
            running: true,
            fullscreen,
        }
    }

    /// Advances one frame and returns draw state if anything changed.
    ///
    /// The first tick only records its timestamp; motion begins on the
    /// second. A `(0, 0)` viewport (minimized window) skips drawing without
    /// consuming the dirty flag, so the next visible frame still repaints.
    pub fn tick(&mut self, now: Instant, viewport: (u32, u32)) -> Option<Frame> {
        if !self.running {
            return None;
        }

        if let Some(last) = self.last_tick {
            let dt_ms = now.duration_since(last).as_secs_f32() * 1000.0;
            if dt_ms > 0.0 {
                self.camera.advance(dt_ms);
            }
        }
        self.last_tick = Some(now);

        if viewport != self.viewport {
            self.viewport = viewport;
            self.camera.invalidate();
        }
        if viewport.0 == 0 || viewport.1 == 0 {
            return None;
        }

        if !self.camera.take_dirty() {
            return None;
        }

        let matrix = transform::view_matrix(
            self.camera.pan(),
            self.camera.tilt(),
            self.camera.zoom(),
            viewport.0 as f32,
            viewport.1 as f32,
        );
        Some(Frame {
            matrix,
            vertex_count: self.mesh.vertex_count(),
        })
    }

    /// Stops the viewer; subsequent ticks return nothing and the host loop
    /// should cease rescheduling.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_ptz(&mut self, pan: f32, tilt: f32, zoom: f32) {
        self.camera.set_ptz(pan, tilt, zoom);
    }

    pub fn ptz(&self) -> Ptz {
        self.camera.ptz()
    }

    /// Forces a repaint on the next tick, e.g. after the texture changed
    /// underneath an otherwise idle camera.
    pub fn invalidate(&mut self) {
        self.camera.invalidate();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen.toggle();
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn pointer_down(&mut self, pos: Vec2, now: Instant) {
        if let Some(action) = self.gestures.pointer_down(pos, now, &mut self.camera) {
            self.apply(action);
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2, zoom_modifier: bool) {
        let radius = self.radius();
        self.gestures
            .pointer_move(pos, zoom_modifier, radius, &mut self.camera);
    }

    pub fn pointer_up(&mut self) {
        self.gestures.pointer_up(&mut self.camera);
    }

    pub fn touch(&mut self, id: u64, phase: TouchPhase, pos: Vec2, now: Instant) {
        let radius = self.radius();
        if let Some(action) = self
            .gestures
            .touch(id, phase, pos, now, radius, &mut self.camera)
        {
            self.apply(action);
        }
    }

    pub fn wheel(&mut self, delta_y: f32) {
        let radius = self.radius();
        self.gestures.wheel(delta_y, radius, &mut self.camera);
    }

    /// Pixel-to-radian scale for gesture deltas, derived from the current
    /// viewport width and zoom.
    fn radius(&self) -> f32 {
        transform::radius(self.viewport.0 as f32, self.camera.zoom())
    }

    fn apply(&mut self, action: GestureAction) {
        match action {
            GestureAction::ToggleFullscreen => self.fullscreen.toggle(),
        }
    }
}

//! Pan/tilt/zoom camera state with inertial damping.

use std::f32::consts::{FRAC_PI_2, TAU};

const TILT_LIMIT: f32 = FRAC_PI_2;
const ZOOM_LIMIT: f32 = 5.0;

/// Residual velocities below this magnitude snap to an exact zero so the
/// coast phase terminates instead of creeping forever.
const VELOCITY_SNAP: f32 = 1e-6;

/// Normalized orientation as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ptz {
    /// Pan angle in `[0, 2π)`.
    pub pan: f32,
    /// Tilt angle in `[-π/2, π/2]`.
    pub tilt: f32,
    /// Zoom exponent in `[-5, 5]`.
    pub zoom: f32,
}

/// Fixed-capacity ring of velocity samples with a running mean.
///
/// Smoothing over the last few drag deltas keeps a single jittery pointer
/// event from dominating the fling velocity on release.
#[derive(Debug, Clone, Copy, Default)]
struct VelocityWindow {
    samples: [f32; 8],
    len: usize,
    next: usize,
}

impl VelocityWindow {
    /// Records one sample, evicting the oldest when full, and returns the
    /// mean of everything currently held.
    fn push(&mut self, sample: f32) -> f32 {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % self.samples.len();
        if self.len < self.samples.len() {
            self.len += 1;
        }
        self.mean()
    }

    fn mean(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        self.samples[..self.len].iter().sum::<f32>() / self.len as f32
    }
}

/// Camera state machine: clamped PTZ values, per-axis velocities, and a
/// dirty flag that gates matrix rebuilds.
///
/// Pan is stored unbounded so drags never hit a wrap seam; it is reduced to
/// `[0, 2π)` only when read through [`Camera::ptz`]. Tilt and zoom clamp on
/// every write.
#[derive(Debug, Clone)]
pub struct Camera {
    pan: f32,
    tilt: f32,
    zoom: f32,
    /// Smoothed velocity per axis (pan, tilt, zoom), in units per millisecond.
    velocity: [f32; 3],
    windows: [VelocityWindow; 3],
    /// PTZ triple as of the end of the previous tick; `None` until the first
    /// tick has run once.
    baseline: Option<[f32; 3]>,
    dragging: bool,
    dirty: bool,
    att: f32,
}

impl Camera {
    /// Creates a camera at the origin orientation.
    ///
    /// `att` is the per-tick velocity attenuation applied while coasting and
    /// must lie strictly between 0 and 1.
    pub fn new(att: f32) -> Self {
        debug_assert!(0.0 < att && att < 1.0, "att out of range: {att}");
        Self {
            pan: 0.0,
            tilt: 0.0,
            zoom: 0.0,
            velocity: [0.0; 3],
            windows: [VelocityWindow::default(); 3],
            baseline: None,
            dragging: false,
            // Start dirty so the very first frame gets a matrix.
            dirty: true,
            att,
        }
    }

    /// Sets the orientation, clamping tilt and zoom to their limits.
    ///
    /// The dirty flag is raised only when a stored value actually changes,
    /// so redundant writes (including clamped-out motion at a limit) do not
    /// trigger a rebuild.
    pub fn set_ptz(&mut self, pan: f32, tilt: f32, zoom: f32) {
        let tilt = tilt.clamp(-TILT_LIMIT, TILT_LIMIT);
        let zoom = zoom.clamp(-ZOOM_LIMIT, ZOOM_LIMIT);
        if pan != self.pan || tilt != self.tilt || zoom != self.zoom {
            self.pan = pan;
            self.tilt = tilt;
            self.zoom = zoom;
            self.dirty = true;
        }
    }

    /// Current orientation with pan reduced to `[0, 2π)`.
    pub fn ptz(&self) -> Ptz {
        Ptz {
            pan: self.pan.rem_euclid(TAU),
            tilt: self.tilt,
            zoom: self.zoom,
        }
    }

    /// Raw pan, unnormalized. Input handlers add deltas to this so a drag
    /// can cross the 0/2π seam without a jump.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Forces a matrix rebuild on the next frame, e.g. after a resize or a
    /// texture swap.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a rebuild is due and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Advances the motion model by `dt_ms` milliseconds.
    ///
    /// The first call only records the baseline triple. After that, a
    /// dragging camera samples `(current - baseline) / dt` per axis into its
    /// velocity window, while a released camera coasts: position is
    /// projected forward by `velocity * dt`, then each velocity is scaled by
    /// `att` and snapped to zero below [`VELOCITY_SNAP`].
    ///
    /// `dt_ms` must be positive; the render loop skips zero-dt ticks.
    pub fn advance(&mut self, dt_ms: f32) {
        let Some(baseline) = self.baseline else {
            self.baseline = Some([self.pan, self.tilt, self.zoom]);
            return;
        };

        if self.dragging {
            let current = [self.pan, self.tilt, self.zoom];
            for axis in 0..3 {
                let sample = (current[axis] - baseline[axis]) / dt_ms;
                self.velocity[axis] = self.windows[axis].push(sample);
            }
        } else {
            let [vp, vt, vz] = self.velocity;
            self.set_ptz(
                self.pan + vp * dt_ms,
                self.tilt + vt * dt_ms,
                self.zoom + vz * dt_ms,
            );
            for v in &mut self.velocity {
                *v *= self.att;
                if v.abs() < VELOCITY_SNAP {
                    *v = 0.0;
                }
            }
        }

        self.baseline = Some([self.pan, self.tilt, self.zoom]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn camera() -> Camera {
        Camera::new(0.98)
    }

    #[test]
    fn set_ptz_clamps_tilt_and_zoom_and_normalizes_pan_on_read() {
        let mut cam = camera();
        cam.set_ptz(10.0, 10.0, 10.0);

        let ptz = cam.ptz();
        assert!((ptz.pan - 10.0f32.rem_euclid(TAU)).abs() < EPS);
        assert_eq!(ptz.tilt, FRAC_PI_2);
        assert_eq!(ptz.zoom, 5.0);
    }

    #[test]
    fn negative_pan_normalizes_only_on_read() {
        let mut cam = camera();
        cam.set_ptz(-1.0, 0.0, 0.0);

        assert_eq!(cam.pan(), -1.0, "raw pan keeps the sign");
        assert!((cam.ptz().pan - (TAU - 1.0)).abs() < EPS);
    }

    #[test]
    fn dirty_raised_only_on_actual_change() {
        let mut cam = camera();
        assert!(cam.take_dirty(), "fresh camera owes one frame");
        assert!(!cam.take_dirty());

        cam.set_ptz(0.0, 0.0, 0.0);
        assert!(!cam.take_dirty(), "no-op write stays clean");

        cam.set_ptz(0.5, 0.0, 0.0);
        assert!(cam.take_dirty());

        // Writing values that clamp back to the stored state is a no-op too.
        cam.set_ptz(0.5, 0.0, 0.0);
        cam.set_ptz(0.5, FRAC_PI_2, 0.0);
        cam.take_dirty();
        cam.set_ptz(0.5, 99.0, 0.0);
        assert!(!cam.take_dirty(), "re-clamped tilt did not change");
    }

    #[test]
    fn first_advance_records_baseline_without_motion() {
        let mut cam = camera();
        cam.velocity = [0.1, 0.0, 0.0];

        cam.advance(16.0);
        assert_eq!(cam.pan(), 0.0, "first tick must not move the camera");

        cam.advance(16.0);
        assert!((cam.pan() - 0.1 * 16.0).abs() < EPS);
    }

    #[test]
    fn drag_samples_feed_the_running_mean() {
        let mut cam = camera();
        cam.set_dragging(true);
        cam.advance(10.0); // baseline only

        cam.set_ptz(1.0, 0.0, 0.0);
        cam.advance(10.0);
        assert!((cam.velocity[0] - 0.1).abs() < EPS);

        cam.set_ptz(3.0, 0.0, 0.0);
        cam.advance(10.0);
        // Mean of 0.1 and 0.2.
        assert!((cam.velocity[0] - 0.15).abs() < EPS);
    }

    #[test]
    fn dragging_advance_does_not_project_position() {
        let mut cam = camera();
        cam.set_dragging(true);
        cam.advance(10.0);
        cam.velocity = [1.0, 1.0, 1.0];

        cam.advance(10.0);
        assert_eq!(cam.pan(), 0.0);
        assert_eq!(cam.tilt(), 0.0);
        assert_eq!(cam.zoom(), 0.0);
    }

    #[test]
    fn release_coasts_then_decays_to_exact_zero() {
        let mut cam = Camera::new(0.5);
        cam.advance(10.0); // baseline
        cam.velocity = [0.001, 0.0, 0.0];

        cam.advance(10.0);
        assert!((cam.pan() - 0.01).abs() < EPS, "projected by v * dt");
        assert!((cam.velocity[0] - 0.0005).abs() < EPS);

        let mut previous = cam.velocity[0];
        for _ in 0..64 {
            cam.advance(10.0);
            assert!(cam.velocity[0] <= previous);
            previous = cam.velocity[0];
        }
        assert_eq!(cam.velocity[0], 0.0, "snap must reach exact zero");

        let pan = cam.pan();
        cam.advance(10.0);
        assert_eq!(cam.pan(), pan, "stopped camera stays put");
    }

    #[test]
    fn tilt_sticks_at_limit_while_velocity_decays() {
        let mut cam = Camera::new(0.5);
        cam.advance(10.0);
        cam.velocity = [0.0, 1.0, 0.0];

        cam.advance(10.0);
        assert_eq!(cam.tilt(), FRAC_PI_2);
        assert!((cam.velocity[1] - 0.5).abs() < EPS, "decay continues at the wall");

        cam.advance(10.0);
        assert_eq!(cam.tilt(), FRAC_PI_2);
    }

    #[test]
    fn velocity_window_caps_at_eight_samples() {
        let mut window = VelocityWindow::default();
        let mut mean = 0.0;
        for sample in 1..=10 {
            mean = window.push(sample as f32);
        }
        // Last eight samples are 3..=10.
        assert!((mean - 6.5).abs() < EPS);
    }

    #[test]
    fn velocity_window_survives_release_and_redrag() {
        let mut cam = camera();
        cam.set_dragging(true);
        cam.advance(10.0);
        cam.set_ptz(1.0, 0.0, 0.0);
        cam.advance(10.0);
        assert!((cam.velocity[0] - 0.1).abs() < EPS);

        cam.set_dragging(false);
        cam.set_dragging(true);
        cam.set_ptz(cam.pan() + 3.0, 0.0, 0.0);
        cam.advance(10.0);
        // New sample 0.3 joins the surviving 0.1.
        assert!((cam.velocity[0] - 0.2).abs() < EPS);
    }
}

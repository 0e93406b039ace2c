use std::cell::Cell;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use glam::Vec2;
use winit::event::TouchPhase;

use spherical_viewer::{FullscreenToggle, NoFullscreen, Viewer, ViewerConfig};

const VIEWPORT: (u32, u32) = (640, 360);
const EPS: f32 = 1e-4;

/// Fullscreen adapter that only counts how often it was asked to toggle.
struct CountingToggle(Rc<Cell<usize>>);

impl FullscreenToggle for CountingToggle {
    fn toggle(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

fn viewer() -> Viewer {
    Viewer::new(ViewerConfig::default(), Box::new(NoFullscreen))
}

fn counting_viewer() -> (Viewer, Rc<Cell<usize>>) {
    let toggles = Rc::new(Cell::new(0));
    let viewer = Viewer::new(
        ViewerConfig::default(),
        Box::new(CountingToggle(toggles.clone())),
    );
    (viewer, toggles)
}

fn at(ms: u64) -> Instant {
    // Tests only compare these among themselves, so any base works.
    static BASE: OnceLock<Instant> = OnceLock::new();
    *BASE.get_or_init(Instant::now) + Duration::from_millis(ms)
}

#[test]
fn test_first_tick_produces_a_frame() {
    let mut viewer = viewer();

    let frame = viewer
        .tick(at(0), VIEWPORT)
        .expect("a fresh viewer owes the host its first frame");

    // Default mesh density is 64x32 bands, two vertices per band column.
    assert_eq!(frame.vertex_count, 2 * 64 * 32);
    assert_eq!(frame.vertex_count, viewer.mesh().vertex_count());

    let matrix = frame.matrix.to_cols_array_2d();
    assert_ne!(matrix, glam::Mat4::IDENTITY.to_cols_array_2d());
    for col in &matrix {
        for &val in col {
            assert!(val.is_finite(), "view matrix contains non-finite values");
        }
    }
}

#[test]
fn test_idle_viewer_stops_reporting_frames() {
    let mut viewer = viewer();

    assert!(viewer.tick(at(0), VIEWPORT).is_some());
    assert!(
        viewer.tick(at(16), VIEWPORT).is_none(),
        "nothing changed, so nothing to draw"
    );
    assert!(viewer.tick(at(32), VIEWPORT).is_none());
}

#[test]
fn test_resize_triggers_a_repaint() {
    let mut viewer = viewer();

    let first = viewer.tick(at(0), VIEWPORT).unwrap();
    assert!(viewer.tick(at(16), VIEWPORT).is_none());

    let resized = viewer
        .tick(at(32), (800, 600))
        .expect("a viewport change must repaint");
    assert_ne!(
        resized.matrix.to_cols_array_2d(),
        first.matrix.to_cols_array_2d(),
        "the matrix folds in the viewport scale"
    );
}

#[test]
fn test_minimized_viewport_suspends_drawing() {
    let mut viewer = viewer();

    assert!(viewer.tick(at(0), VIEWPORT).is_some());
    viewer.set_ptz(1.0, 0.0, 0.0);

    // Minimized: no frames, however dirty the camera is.
    assert!(viewer.tick(at(16), (0, 0)).is_none());
    assert!(viewer.tick(at(32), (0, 0)).is_none());

    // Restored: the pending repaint comes through.
    assert!(viewer.tick(at(48), VIEWPORT).is_some());
}

#[test]
fn test_stopped_viewer_reports_nothing() {
    let mut viewer = viewer();
    assert!(viewer.is_running());

    viewer.stop();
    assert!(!viewer.is_running());

    // Stopping also wins over a dirty camera.
    viewer.set_ptz(1.0, 1.0, 1.0);
    assert!(viewer.tick(at(0), VIEWPORT).is_none());
}

#[test]
fn test_set_ptz_clamps_and_normalizes_for_display() {
    let mut viewer = viewer();
    viewer.set_ptz(10.0, 10.0, 10.0);

    let ptz = viewer.ptz();
    assert!((ptz.pan - (10.0 - TAU)).abs() < EPS, "pan reduced mod 2pi");
    assert_eq!(ptz.tilt, FRAC_PI_2);
    assert_eq!(ptz.zoom, 5.0);
}

#[test]
fn test_repeated_set_ptz_does_not_retrigger_frames() {
    let mut viewer = viewer();

    viewer.set_ptz(1.0, 2.0, 3.0);
    assert!(viewer.tick(at(0), VIEWPORT).is_some());
    assert!(viewer.tick(at(16), VIEWPORT).is_none());

    // Identical values, including the re-clamped tilt, change nothing.
    viewer.set_ptz(1.0, 2.0, 3.0);
    assert!(viewer.tick(at(32), VIEWPORT).is_none());
}

#[test]
fn test_invalidate_forces_a_repaint() {
    let mut viewer = viewer();

    assert!(viewer.tick(at(0), VIEWPORT).is_some());
    assert!(viewer.tick(at(16), VIEWPORT).is_none());

    viewer.invalidate();
    assert!(
        viewer.tick(at(32), VIEWPORT).is_some(),
        "a texture swap needs a frame even with an idle camera"
    );
}

#[test]
fn test_drag_routes_through_the_camera() {
    let mut viewer = viewer();

    viewer.pointer_down(Vec2::new(100.0, 100.0), at(0));
    viewer.pointer_move(Vec2::new(200.0, 100.0), false);

    // 100px over the default radius of 640 (width 640, zoom 0), panning
    // against the pointer.
    let ptz = viewer.ptz();
    assert!((ptz.pan - (TAU - 100.0 / 640.0)).abs() < EPS);
    assert_eq!(ptz.tilt, 0.0);

    // With the modifier held the vertical delta zooms instead.
    viewer.pointer_move(Vec2::new(200.0, 150.0), true);
    let ptz = viewer.ptz();
    assert!((ptz.zoom - 50.0 / 640.0).abs() < EPS);
    assert!((ptz.pan - (TAU - 100.0 / 640.0)).abs() < EPS, "pan untouched");

    viewer.pointer_up();
}

#[test]
fn test_wheel_zooms_scaled_by_radius() {
    let mut viewer = viewer();

    // Scrolling toward the user zooms in: 100 / 640 * 0.1.
    viewer.wheel(100.0);
    assert!((viewer.ptz().zoom - 0.015625).abs() < EPS);

    viewer.wheel(-200.0);
    assert!(viewer.ptz().zoom < 0.0, "scrolling away zooms back out");
}

#[test]
fn test_touch_orbit_reaches_the_camera() {
    let mut viewer = viewer();

    viewer.touch(7, TouchPhase::Started, Vec2::new(50.0, 50.0), at(0));
    viewer.touch(7, TouchPhase::Moved, Vec2::new(114.0, 50.0), at(16));

    assert!((viewer.ptz().pan - (TAU - 0.1)).abs() < EPS, "64px over radius 640");

    viewer.touch(7, TouchPhase::Ended, Vec2::new(114.0, 50.0), at(32));
}

#[test]
fn test_double_tap_toggles_fullscreen() {
    let (mut viewer, toggles) = counting_viewer();
    let p = Vec2::new(10.0, 10.0);

    viewer.touch(1, TouchPhase::Started, p, at(0));
    viewer.touch(1, TouchPhase::Ended, p, at(50));
    assert_eq!(toggles.get(), 0, "one tap is not enough");

    viewer.touch(1, TouchPhase::Started, p, at(200));
    viewer.touch(1, TouchPhase::Ended, p, at(250));
    assert_eq!(toggles.get(), 1, "second tap inside 300ms toggles");

    // Too slow after the previous tap.
    viewer.touch(1, TouchPhase::Started, p, at(600));
    viewer.touch(1, TouchPhase::Ended, p, at(650));
    assert_eq!(toggles.get(), 1);
}

#[test]
fn test_double_click_toggles_fullscreen() {
    let (mut viewer, toggles) = counting_viewer();

    viewer.pointer_down(Vec2::ZERO, at(0));
    viewer.pointer_up();
    viewer.pointer_down(Vec2::ZERO, at(150));
    viewer.pointer_up();

    assert_eq!(toggles.get(), 1);

    // Menu and keybinding path.
    viewer.toggle_fullscreen();
    assert_eq!(toggles.get(), 2);
}

#[test]
fn test_released_drag_coasts_to_rest() {
    let mut viewer = viewer();
    assert!(viewer.tick(at(0), VIEWPORT).is_some());

    // Build up velocity with a steady drag, one tick per move.
    viewer.pointer_down(Vec2::new(100.0, 100.0), at(0));
    let mut now = 0;
    for i in 1..=5u64 {
        viewer.pointer_move(Vec2::new(100.0 + 20.0 * i as f32, 100.0), false);
        now = i * 16;
        viewer.tick(at(now), VIEWPORT);
    }
    viewer.pointer_up();
    let pan_at_release = viewer.ptz().pan;

    // Coasting keeps producing frames until the velocity snaps to zero.
    let mut rested_at = None;
    for _ in 0..2000 {
        now += 16;
        if viewer.tick(at(now), VIEWPORT).is_none() {
            rested_at = Some(now);
            break;
        }
    }
    let rested_at = rested_at.expect("attenuation must bring the camera to rest");

    // Rest is stable, not a skipped frame.
    assert!(viewer.tick(at(rested_at + 16), VIEWPORT).is_none());
    assert!(viewer.tick(at(rested_at + 32), VIEWPORT).is_none());

    let pan_at_rest = viewer.ptz().pan;
    assert!(
        (pan_at_rest - pan_at_release).abs() > 0.1,
        "inertia carries the pan well past the release point"
    );
}

#[test]
fn test_frame_matches_configured_mesh_density() {
    let config = ViewerConfig {
        h_div: 4,
        v_div: 2,
        ..ViewerConfig::default()
    };
    let mut viewer = Viewer::new(config, Box::new(NoFullscreen));

    let frame = viewer.tick(at(0), VIEWPORT).unwrap();
    assert_eq!(frame.vertex_count, 16);
}

#[test]
fn test_extreme_ptz_still_yields_a_finite_matrix() {
    let mut viewer = viewer();
    viewer.set_ptz(1.0e6, -1.0e6, 1.0e6);

    let frame = viewer.tick(at(0), VIEWPORT).unwrap();
    for col in &frame.matrix.to_cols_array_2d() {
        for &val in col {
            assert!(val.is_finite(), "matrix must stay finite at the clamps");
        }
    }
}

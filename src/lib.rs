//! Equirectangular panorama viewer.
//!
//! Renders a 360°×180° photo onto the inside of a sphere and lets the user
//! look around: drag to pan and tilt with fling inertia, pinch / ctrl-drag /
//! scroll to zoom, double-click or double-tap for fullscreen. Projection is
//! an affine pseudo-projection with no perspective divide, which gives the
//! characteristic wide, fisheye-like field of view.
//!
//! The crate splits into a render-loop core ([`Viewer`]) that owns camera
//! state, gestures, and the sphere mesh, and a wgpu backend ([`Renderer`])
//! that draws what the core decides. The core is plain math and runs
//! headless, which is how the tests exercise it.
//!
//! # Library Usage
//!
//! ```
//! use spherical_viewer::{NoFullscreen, Viewer, ViewerConfig};
//!
//! let mut viewer = Viewer::new(ViewerConfig::default(), Box::new(NoFullscreen));
//! viewer.set_ptz(10.0, 10.0, 10.0);
//!
//! // Tilt and zoom clamp; pan normalizes on read.
//! let ptz = viewer.ptz();
//! assert!((ptz.pan - 10.0f32.rem_euclid(std::f32::consts::TAU)).abs() < 1e-6);
//! assert_eq!(ptz.tilt, std::f32::consts::FRAC_PI_2);
//! assert_eq!(ptz.zoom, 5.0);
//! ```

pub mod camera;
pub mod config;
pub mod error;
pub mod fullscreen;
pub mod input;
pub mod mesh;
pub mod renderer;
pub mod transform;
pub mod viewer;

// Re-export key types
pub use camera::Ptz;
pub use config::ViewerConfig;
pub use error::ViewerError;
pub use fullscreen::{FullscreenToggle, NoFullscreen, WindowFullscreen};
pub use input::GestureAction;
pub use mesh::{build_sphere, SphereMesh};
pub use renderer::Renderer;
pub use viewer::{Frame, Viewer};

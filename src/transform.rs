//! View-matrix construction for the affine sphere projection.
//!
//! There is no perspective divide anywhere in this pipeline: every matrix is
//! affine, clip `w` stays 1, and magnification comes solely from scaling the
//! sphere radius with zoom. The sphere is larger than the viewport, so the
//! screen shows a central crop of the near hemisphere.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

/// Zoom is an exponent on this base: each whole zoom step scales the sphere
/// radius by 1.5x.
pub const ZOOM_BASE: f32 = 1.5;

/// Distance the sphere center sits past the mid-depth point, in world units.
/// Keeps the near surface just inside the near plane instead of on it.
pub const DEPTH_OFFSET: f32 = 10.0;

/// The projection math produces OpenGL-style clip depth in `[-1, 1]`; wgpu
/// clips `z` to `[0, 1]`, so the renderer premultiplies this remap.
pub const GL_TO_WGPU_DEPTH: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.0, 0.0, 0.5, 1.0,
]);

/// Sphere radius in pixels for a viewport width and zoom exponent.
pub fn radius(viewport_width: f32, zoom: f32) -> f32 {
    viewport_width * ZOOM_BASE.powf(zoom)
}

/// Builds the model-view matrix applied to unit-sphere vertices.
///
/// Reading right to left: scale to the zoom radius, orient by pan (about Y,
/// offset a quarter turn so pan 0 faces the texture seam) and tilt (about X),
/// push the center to `radius + DEPTH_OFFSET` deep, then map the
/// pixel-space box onto the `[-1, 1]` clip cube.
pub fn view_matrix(pan: f32, tilt: f32, zoom: f32, width: f32, height: f32) -> Mat4 {
    let r = radius(width, zoom);
    Mat4::from_translation(Vec3::new(-1.0, -1.0, -1.0))
        * Mat4::from_scale(Vec3::splat(2.0))
        * Mat4::from_scale(Vec3::new(1.0 / width, 1.0 / height, 1.0 / (2.0 * r)))
        * Mat4::from_translation(Vec3::new(width / 2.0, height / 2.0, r + DEPTH_OFFSET))
        * Mat4::from_rotation_x(tilt)
        * Mat4::from_rotation_y(pan - FRAC_PI_2)
        * Mat4::from_scale(Vec3::splat(r))
}

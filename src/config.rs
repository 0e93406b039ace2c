//! Viewer configuration.

use std::path::PathBuf;

/// Configuration for a [`Viewer`](crate::Viewer), fixed after construction.
///
/// Missing fields fall back to defaults via struct-update syntax:
///
/// ```
/// use spherical_viewer::ViewerConfig;
///
/// let config = ViewerConfig {
///     width: 1280,
///     height: 720,
///     ..ViewerConfig::default()
/// };
/// assert_eq!(config.h_div, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Equirectangular source image. `None` leaves the placeholder texture
    /// in place; the viewer stays fully navigable either way.
    pub src: Option<PathBuf>,
    /// Requested viewport width in pixels.
    pub width: u32,
    /// Requested viewport height in pixels.
    pub height: u32,
    /// Horizontal mesh subdivisions (full 360° circle).
    pub h_div: u32,
    /// Vertical mesh bands (180° pole to pole). Convention: `h_div / 2`.
    pub v_div: u32,
    /// Velocity attenuation applied once per tick while coasting. Must lie
    /// in the open interval (0, 1); higher values coast longer.
    pub att: f32,
    /// Optional cap on the panorama texture dimension, applied on top of
    /// the device limit.
    pub max_texture_size: Option<u32>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            src: None,
            width: 640,
            height: 360,
            h_div: 64,
            v_div: 32,
            att: 0.98,
            max_texture_size: None,
        }
    }
}

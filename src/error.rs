//! Construction-time error types.

/// Fatal conditions while bringing up the viewer's graphics backend.
///
/// These can only occur during construction; per-frame work (motion
/// integration, matrix rebuild, draw submission) has no failure modes.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to acquire graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// Shader compilation or pipeline validation failed. Carries the
    /// backend's diagnostic string.
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),
}

//! Rendering error types.

use thiserror::Error;

/// Errors that can occur while setting up or validating GPU work.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Shader assembly failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// A frame operation was requested outside `begin_frame`/`finish_frame`.
    #[error("no frame in progress")]
    NoFrameInProgress,

    /// Reading a texture back to the CPU failed.
    #[error("failed to map readback buffer")]
    BufferMapFailed,

    /// Waiting on the device failed.
    #[error("failed to poll device: {0}")]
    PollFailed(#[from] wgpu::PollError),

    /// The device reported a validation error.
    #[error("GPU validation error: {0}")]
    Validation(String),

    /// The backend failed internally, e.g. translating a shader.
    #[error("GPU internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_error_converts() {
        let err = RenderError::from(wgpu::PollError::Timeout);
        assert!(matches!(err, RenderError::PollFailed(_)));
        assert!(err.to_string().starts_with("failed to poll device"));
    }
}

//! Error types for occlusion-rs.

use thiserror::Error;

/// The main error type for occlusion-rs operations.
///
/// The per-frame pipeline itself never fails; these errors come from the
/// surfaces around it (settings files, camera bookkeeping).
#[derive(Error, Debug)]
pub enum OcclusionError {
    /// No pipeline is registered for the given camera.
    #[error("camera {0} has no occlusion pipeline")]
    UnknownCamera(u64),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for occlusion-rs operations.
pub type Result<T> = std::result::Result<T, OcclusionError>;

//! Core abstractions for occlusion-rs.
//!
//! This crate provides the backend-agnostic parts of the screen-space
//! ambient occlusion pipeline:
//! - [`OcclusionSettings`], the passive configuration record
//! - [`VariantSelector`] and the [`PermutationTable`] of shader variants
//! - [`OcclusionParams::derive`], the per-frame uniform derivation
//! - [`BufferDescriptor`] rules for the intermediate buffers
//! - [`OcclusionBackend`], the host renderer seam

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel dimensions are converted to f32 for uniform math
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod descriptor;
pub mod error;
pub mod params;
pub mod settings;
pub mod variant;

pub use backend::{
    Blit, BlitProgram, BlitSource, BlitTarget, BufferSlot, OcclusionBackend, ShaderPass,
    PROFILING_SCOPE, SCREEN_SPACE_OCCLUSION, SCREEN_SPACE_OCCLUSION_TEXTURE,
};
pub use descriptor::{BufferDescriptor, BufferFormat, CameraTargetDescriptor, FilterMode};
pub use error::{OcclusionError, Result};
pub use params::{CameraFrameContext, OcclusionParams};
pub use settings::{
    Algorithm, BlurWidth, DebugMode, NormalReconstruction, OcclusionSettings, Quality, Resolution,
};
pub use variant::{
    ActiveVariant, AlgorithmTag, BlurTag, DebugTag, NormalTag, PermutationId, PermutationTable,
    QualityTag, VariantKey, VariantSelector,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec4};

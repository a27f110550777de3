//! occlusion-rs: screen-space ambient occlusion for Rust renderers.
//!
//! The crate orchestrates a multi-pass occlusion effect on top of a host
//! renderer: it derives per-frame parameters from the camera, picks the
//! shader permutation, manages the intermediate buffers and records the
//! passes in order.
//!
//! # Quick Start
//!
//! ```
//! use occlusion::*;
//!
//! let settings = SharedSettings::new(
//!     OcclusionSettings::new()
//!         .with_intensity(1.0)
//!         .with_resolution(Resolution::Half),
//! );
//! let mut feature = OcclusionFeature::new(settings.clone());
//! let mut backend = RecordingBackend::new();
//!
//! let frame = CameraFrameContext::new(
//!     Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0),
//!     Mat4::IDENTITY,
//!     CameraTargetDescriptor::new(1920, 1080, BufferFormat::Rgba16Float),
//! );
//!
//! feature.render_camera(CameraId(1), &frame, &mut backend);
//! assert_eq!(
//!     backend.passes(),
//!     vec![
//!         ShaderPass::Estimate,
//!         ShaderPass::BlurHorizontal,
//!         ShaderPass::BlurVertical,
//!         ShaderPass::Composite,
//!     ]
//! );
//! ```
//!
//! # Architecture
//!
//! - [`OcclusionFeature`] - host entry point, one [`OcclusionPipeline`] per camera
//! - [`PassSequencer`] - estimate, optional blur, composite, publish
//! - [`RenderTargetManager`] - the final, raw and temp buffers
//! - [`DebugOverlay`] - optional copy of the raw buffer onto the camera
//! - [`OcclusionBackend`] - the seam to the host renderer; [`WgpuBackend`]
//!   runs on wgpu and [`RecordingBackend`] records commands

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod debug_overlay;
pub mod feature;
pub mod headless;
pub mod pipeline;
pub mod recording;
pub mod render_targets;
pub mod sequencer;

pub use config::{load_settings, parse_settings, save_settings, SharedSettings};
pub use debug_overlay::DebugOverlay;
pub use feature::{CameraFrameScope, CameraId, OcclusionFeature};
pub use headless::{
    capture_gpu_errors, render_headless, render_with_context, HeadlessFrame, HeadlessOutput,
};
pub use pipeline::{EnqueuedPasses, OcclusionPipeline, PipelineState};
pub use recording::{
    Command, Endpoint, RecordedBlit, RecordedProgram, RecordingBackend, TextureHandle,
};
pub use render_targets::RenderTargetManager;
pub use sequencer::PassSequencer;

// Re-export core types
pub use occlusion_core::{
    ActiveVariant, Algorithm, BlurWidth, BufferDescriptor, BufferFormat, BufferSlot,
    CameraFrameContext, CameraTargetDescriptor, DebugMode, FilterMode, Mat4,
    NormalReconstruction, OcclusionBackend, OcclusionError, OcclusionParams, OcclusionSettings,
    PermutationId, PermutationTable, Quality, Resolution, Result, ShaderPass, VariantKey,
    VariantSelector, Vec4, PROFILING_SCOPE, SCREEN_SPACE_OCCLUSION,
    SCREEN_SPACE_OCCLUSION_TEXTURE,
};

// Re-export render types
pub use occlusion_render::{FrameInputs, GpuContext, RenderError, RenderResult, WgpuBackend};

/// Initializes `env_logger` from `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("occlusion-rs logging initialized");
    }
}

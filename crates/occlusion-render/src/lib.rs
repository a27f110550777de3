//! wgpu backend for occlusion-rs.
//!
//! This crate provides the GPU side of the occlusion pipeline:
//! - Texture allocation for the intermediate buffers
//! - WGSL programs specialised per shader permutation
//! - A lazily filled pipeline cache
//! - [`WgpuBackend`], implementing [`occlusion_core::OcclusionBackend`]

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod context;
pub mod error;
pub mod globals;
pub mod pipelines;
pub mod shader;
pub mod texture;
pub mod uniforms;

pub use backend::{z_buffer_params, FrameInputs, WgpuBackend};
pub use context::GpuContext;
pub use error::{RenderError, RenderResult};
pub use globals::GlobalRegistry;
pub use pipelines::OcclusionPipelines;
pub use shader::{permutation_header, ShaderBuilder};
pub use texture::{read_rgba8, texture_format, GpuTexture};
pub use uniforms::OcclusionUniforms;

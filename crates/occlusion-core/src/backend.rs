//! The seam between the occlusion pipeline and the host renderer.
//!
//! The pipeline decides *what* to draw and in which order; an
//! [`OcclusionBackend`] owns textures, runs the GPU programs and provides
//! the process-wide texture and keyword registries.

use crate::descriptor::BufferDescriptor;
use crate::params::OcclusionParams;
use crate::variant::PermutationId;

/// Name under which the final occlusion buffer is published.
pub const SCREEN_SPACE_OCCLUSION_TEXTURE: &str = "_ScreenSpaceOcclusionTexture";

/// Keyword telling downstream lighting that the occlusion texture is valid.
pub const SCREEN_SPACE_OCCLUSION: &str = "_SCREEN_SPACE_OCCLUSION";

/// Label of the scope wrapping one camera's occlusion passes.
pub const PROFILING_SCOPE: &str = "ScreenSpaceOcclusion";

/// The three intermediate buffers owned by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    /// Composite output, published to the host.
    Final,
    /// Raw occlusion, also the blur's final destination.
    Raw,
    /// Blur ping-pong buffer.
    Temp,
}

impl BufferSlot {
    pub const ALL: [Self; 3] = [Self::Final, Self::Raw, Self::Temp];

    /// Debug label for the allocated texture.
    pub fn label(self) -> &'static str {
        match self {
            Self::Final => "OcclusionFinalRT",
            Self::Raw => "OcclusionDepthRT",
            Self::Temp => "OcclusionTempRT",
        }
    }
}

/// Programs of the occlusion shader, indexed as the host binds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPass {
    Estimate = 0,
    BlurHorizontal = 1,
    BlurVertical = 2,
    Composite = 3,
}

impl ShaderPass {
    pub const ALL: [Self; 4] = [
        Self::Estimate,
        Self::BlurHorizontal,
        Self::BlurVertical,
        Self::Composite,
    ];

    /// Pass index.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Estimate => "Occlusion Estimate",
            Self::BlurHorizontal => "Occlusion Blur H",
            Self::BlurVertical => "Occlusion Blur V",
            Self::Composite => "Occlusion Composite",
        }
    }
}

/// Where a blit reads from.
#[derive(Debug)]
pub enum BlitSource<'a, T> {
    /// The host's resolved camera color, with depth and normals bound alongside.
    CameraColor,
    Buffer(&'a T),
}

/// Where a blit writes to.
#[derive(Debug)]
pub enum BlitTarget<'a, T> {
    /// The host's camera color target.
    CameraColor,
    Buffer(&'a T),
}

/// Program executed by a blit.
#[derive(Debug, Clone, Copy)]
pub enum BlitProgram<'a> {
    /// One pass of the occlusion shader specialised for `permutation`.
    Occlusion {
        pass: ShaderPass,
        permutation: PermutationId,
        params: &'a OcclusionParams,
    },
    /// Plain texture copy.
    Copy,
}

/// One full-screen pass.
#[derive(Debug)]
pub struct Blit<'a, T> {
    pub source: BlitSource<'a, T>,
    pub target: BlitTarget<'a, T>,
    pub program: BlitProgram<'a>,
    pub label: &'static str,
}

/// Host services used by the occlusion pipeline.
///
/// Implementations record work; nothing here may block beyond command
/// submission. Allocation failures are the host allocator's to report.
pub trait OcclusionBackend {
    /// Host texture handle.
    type Texture;

    /// Allocates a texture matching `descriptor`.
    fn allocate_texture(&mut self, descriptor: &BufferDescriptor, slot: BufferSlot)
        -> Self::Texture;

    /// Frees a texture previously returned by [`allocate_texture`](Self::allocate_texture).
    fn release_texture(&mut self, texture: Self::Texture);

    /// Records one full-screen pass.
    fn blit(&mut self, blit: &Blit<'_, Self::Texture>);

    /// Opens a labelled scope around subsequent blits.
    fn push_scope(&mut self, _label: &'static str) {}

    /// Closes the innermost scope.
    fn pop_scope(&mut self) {}

    /// Publishes `texture` under a global name.
    fn set_global_texture(&mut self, name: &'static str, texture: &Self::Texture);

    /// Removes a published global texture.
    fn clear_global_texture(&mut self, name: &'static str);

    /// Toggles a process-wide keyword.
    fn set_keyword(&mut self, name: &'static str, enabled: bool);
}

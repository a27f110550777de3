//! Render target descriptors.

use serde::{Deserialize, Serialize};

use crate::settings::Resolution;

/// Color format of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferFormat {
    R8Unorm,
    R16Float,
    Rgba8Unorm,
    #[default]
    Rgba16Float,
}

/// Texture filtering used when an intermediate buffer is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
}

/// Description of the camera's color target, supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraTargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: BufferFormat,
    pub sample_count: u32,
    pub depth_bits: u32,
}

impl CameraTargetDescriptor {
    /// Creates a single-sampled target without depth.
    pub fn new(width: u32, height: u32, format: BufferFormat) -> Self {
        Self {
            width,
            height,
            format,
            sample_count: 1,
            depth_bits: 0,
        }
    }

    /// Sets the multisample count.
    #[must_use]
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Sets the depth bit count.
    #[must_use]
    pub fn with_depth_bits(mut self, depth_bits: u32) -> Self {
        self.depth_bits = depth_bits;
        self
    }
}

/// Description of one intermediate occlusion buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: BufferFormat,
    pub sample_count: u32,
    pub depth_bits: u32,
    pub filter: FilterMode,
}

impl BufferDescriptor {
    /// Derives the occlusion buffer descriptor from the camera target.
    ///
    /// Multisampling and depth are dropped. Half resolution halves each axis
    /// by shifting right one bit, so odd sizes round down.
    pub fn for_occlusion(target: &CameraTargetDescriptor, resolution: Resolution) -> Self {
        let (width, height) = match resolution {
            Resolution::Full => (target.width, target.height),
            Resolution::Half => (target.width >> 1, target.height >> 1),
        };
        Self {
            width,
            height,
            format: target.format,
            sample_count: 1,
            depth_bits: 0,
            filter: FilterMode::Bilinear,
        }
    }

    /// Returns true if a buffer allocated with `self` cannot serve `requested`.
    ///
    /// Filtering is sampler state and never forces a reallocation.
    pub fn requires_reallocation(&self, requested: &Self) -> bool {
        self.width != requested.width
            || self.height != requested.height
            || self.format != requested.format
            || self.sample_count != requested.sample_count
            || self.depth_bits != requested.depth_bits
    }
}

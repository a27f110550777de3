//! Per-frame parameter derivation.
//!
//! [`OcclusionParams::derive`] turns camera geometry and settings into the
//! numeric values consumed by the occlusion programs. The formulas are
//! tuned against the GPU kernels and must stay exact.

use glam::{Mat4, Vec4};

use crate::descriptor::CameraTargetDescriptor;
use crate::settings::{Algorithm, OcclusionSettings, Resolution};

/// Reference resolution the pixel radius budget is expressed at.
const REFERENCE_PIXELS: f32 = 1080.0 * 1920.0;

/// Lower bound of the derived pixel radius.
pub const MIN_RADIUS_PIXELS: f32 = 16.0;

/// Camera state for one frame, supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrameContext {
    /// Projection matrix.
    pub projection: Mat4,
    /// World-to-camera (view) matrix.
    pub world_to_camera: Mat4,
    /// The camera's color target.
    pub target: CameraTargetDescriptor,
}

impl CameraFrameContext {
    pub fn new(projection: Mat4, world_to_camera: Mat4, target: CameraTargetDescriptor) -> Self {
        Self {
            projection,
            world_to_camera,
            target,
        }
    }
}

/// Uniform values for one frame of the occlusion programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionParams {
    /// `(1/w, 1/h, w, h)` of the camera target.
    pub full_texel_size: Vec4,
    /// `(1/w, 1/h, w, h)` of the occlusion buffers.
    pub scaled_texel_size: Vec4,
    /// Half-texel bias for half-resolution upsampling, ones otherwise.
    pub target_scale: Vec4,
    /// Maps UV and linear depth to a view-space position.
    pub uv_to_view: Vec4,
    pub world_to_camera: Mat4,
    /// Bound only for [`Algorithm::ScalableObscurance`].
    pub camera_projection: Option<Mat4>,
    pub radius: f32,
    /// World radius expressed in pixels at unit depth.
    pub radius_to_screen: f32,
    pub max_radius_pixels: f32,
    pub inv_radius2: f32,
    pub angle_bias: f32,
    pub ao_multiplier: f32,
    pub intensity: f32,
    pub thickness: f32,
    pub max_distance: f32,
    pub distance_falloff: f32,
    pub blur_sharpness: f32,
    pub direct_lighting_strength: f32,
}

/// Pixel radius budget scaled to the target's pixel count, floored at 16.
pub fn max_radius_pixels(configured: f32, width: u32, height: u32) -> f32 {
    let pixels = (u64::from(width) * u64::from(height)) as f32;
    MIN_RADIUS_PIXELS.max(configured * (pixels / REFERENCE_PIXELS).sqrt())
}

/// Occlusion multiplier compensating for the horizon angle bias.
pub fn ao_multiplier(bias: f32) -> f32 {
    2.0 * (1.0 / (1.0 - bias))
}

/// `(1/w, 1/h, w, h)`.
pub fn texel_size(width: u32, height: u32) -> Vec4 {
    let (w, h) = (width as f32, height as f32);
    Vec4::new(1.0 / w, 1.0 / h, w, h)
}

impl OcclusionParams {
    /// Derives all uniform values for a frame.
    ///
    /// `ao_width`/`ao_height` are the dimensions of the occlusion buffers,
    /// which differ from the camera target at half resolution.
    pub fn derive(
        frame: &CameraFrameContext,
        settings: &OcclusionSettings,
        ao_width: u32,
        ao_height: u32,
    ) -> Self {
        let width = frame.target.width;
        let height = frame.target.height;
        let (w, h) = (width as f32, height as f32);

        let inv_focal_len_x = 1.0 / frame.projection.x_axis.x;
        let inv_focal_len_y = 1.0 / frame.projection.y_axis.y;

        let target_scale = match settings.resolution {
            Resolution::Half => Vec4::new((w + 0.5) / w, (h + 0.5) / h, 1.0, 1.0),
            Resolution::Full => Vec4::ONE,
        };

        let camera_projection = (settings.algorithm == Algorithm::ScalableObscurance)
            .then_some(frame.projection);

        Self {
            full_texel_size: texel_size(width, height),
            scaled_texel_size: texel_size(ao_width, ao_height),
            target_scale,
            uv_to_view: Vec4::new(
                2.0 * inv_focal_len_x,
                -2.0 * inv_focal_len_y,
                -inv_focal_len_x,
                inv_focal_len_y,
            ),
            world_to_camera: frame.world_to_camera,
            camera_projection,
            radius: settings.radius,
            radius_to_screen: settings.radius * 0.5 * (h / (inv_focal_len_y * 2.0)),
            max_radius_pixels: max_radius_pixels(settings.max_radius_pixels, width, height),
            inv_radius2: 1.0 / (settings.radius * settings.radius),
            angle_bias: settings.bias,
            ao_multiplier: ao_multiplier(settings.bias),
            intensity: settings.intensity,
            thickness: settings.thickness,
            max_distance: settings.max_distance,
            distance_falloff: settings.distance_falloff,
            blur_sharpness: settings.sharpness,
            direct_lighting_strength: settings.direct_lighting_strength,
        }
    }
}

//! GPU layout of the occlusion uniform block.

use glam::Mat4;
use occlusion_core::OcclusionParams;

/// GPU representation of [`OcclusionParams`].
///
/// Field order matches `OcclusionUniforms` in `shaders/occlusion.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OcclusionUniforms {
    pub world_to_camera: [[f32; 4]; 4],
    pub camera_projection: [[f32; 4]; 4],
    pub full_texel_size: [f32; 4],
    pub scaled_texel_size: [f32; 4],
    pub target_scale: [f32; 4],
    pub uv_to_view: [f32; 4],
    /// Depth linearisation terms supplied by the host: `(m22, m32, 0, 0)`.
    pub z_buffer_params: [f32; 4],
    pub radius: f32,
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

impl Default for OcclusionUniforms {
    fn default() -> Self {
        Self {
            world_to_camera: Mat4::IDENTITY.to_cols_array_2d(),
            camera_projection: Mat4::IDENTITY.to_cols_array_2d(),
            full_texel_size: [1.0; 4],
            scaled_texel_size: [1.0; 4],
            target_scale: [1.0; 4],
            uv_to_view: [2.0, -2.0, -1.0, 1.0],
            z_buffer_params: [0.0, 1.0, 0.0, 0.0],
            radius: 0.8,
            radius_to_screen: 0.0,
            max_radius_pixels: 128.0,
            inv_radius2: 1.0 / 0.64,
            angle_bias: 0.5,
            ao_multiplier: 4.0,
            intensity: 0.0,
            thickness: 0.0,
            max_distance: 150.0,
            distance_falloff: 50.0,
            blur_sharpness: 8.0,
            direct_lighting_strength: 0.25,
        }
    }
}

impl OcclusionUniforms {
    /// Sets the depth linearisation terms.
    #[must_use]
    pub fn with_z_buffer_params(mut self, m22: f32, m32: f32) -> Self {
        self.z_buffer_params = [m22, m32, 0.0, 0.0];
        self
    }
}

impl From<&OcclusionParams> for OcclusionUniforms {
    fn from(params: &OcclusionParams) -> Self {
        Self {
            world_to_camera: params.world_to_camera.to_cols_array_2d(),
            camera_projection: params
                .camera_projection
                .unwrap_or(Mat4::IDENTITY)
                .to_cols_array_2d(),
            full_texel_size: params.full_texel_size.to_array(),
            scaled_texel_size: params.scaled_texel_size.to_array(),
            target_scale: params.target_scale.to_array(),
            uv_to_view: params.uv_to_view.to_array(),
            z_buffer_params: [0.0, 1.0, 0.0, 0.0],
            radius: params.radius,
            radius_to_screen: params.radius_to_screen,
            max_radius_pixels: params.max_radius_pixels,
            inv_radius2: params.inv_radius2,
            angle_bias: params.angle_bias,
            ao_multiplier: params.ao_multiplier,
            intensity: params.intensity,
            thickness: params.thickness,
            max_distance: params.max_distance,
            distance_falloff: params.distance_falloff,
            blur_sharpness: params.blur_sharpness,
            direct_lighting_strength: params.direct_lighting_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occlusion_core::{
        Algorithm, BufferFormat, CameraFrameContext, CameraTargetDescriptor, OcclusionSettings,
    };

    #[test]
    fn test_uniform_size_is_16_byte_aligned() {
        let size = std::mem::size_of::<OcclusionUniforms>();
        assert_eq!(size, 256);
        assert_eq!(size % 16, 0);
    }

    #[test]
    fn test_projection_written_for_sao_only() {
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 50.0);
        let frame = CameraFrameContext::new(
            projection,
            Mat4::IDENTITY,
            CameraTargetDescriptor::new(300, 200, BufferFormat::Rgba8Unorm),
        );

        let sao = OcclusionSettings::new().with_algorithm(Algorithm::ScalableObscurance);
        let uniforms = OcclusionUniforms::from(&OcclusionParams::derive(&frame, &sao, 300, 200));
        assert_eq!(uniforms.camera_projection, projection.to_cols_array_2d());

        let gtao = OcclusionSettings::new();
        let uniforms = OcclusionUniforms::from(&OcclusionParams::derive(&frame, &gtao, 300, 200));
        assert_eq!(uniforms.camera_projection, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(uniforms.scaled_texel_size, [1.0 / 300.0, 1.0 / 200.0, 300.0, 200.0]);
    }
}

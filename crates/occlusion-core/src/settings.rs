//! Screen-space occlusion settings.
//!
//! [`OcclusionSettings`] is a passive record owned by whatever configuration
//! surface the host exposes. The pipeline only ever reads a snapshot of it.

use serde::{Deserialize, Serialize};

/// Occlusion estimation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Horizon-based ambient occlusion (HBAO).
    HorizonBased,
    /// Ground-truth-based ambient occlusion (GTAO).
    #[default]
    GroundTruthBased,
    /// Scalable ambient obscurance (SAO).
    ScalableObscurance,
}

/// Number of visibility samples taken per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

/// Resolution of the intermediate occlusion buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// Same size as the camera target.
    #[default]
    Full,
    /// Camera target size shifted right by one bit per axis.
    Half,
}

/// Width of the separable blur applied to the raw occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlurWidth {
    /// No blur passes are issued.
    None,
    X2,
    #[default]
    X3,
    X4,
    X5,
}

impl BlurWidth {
    /// Returns true if blur passes should be issued.
    pub fn is_enabled(self) -> bool {
        self != Self::None
    }
}

/// Reconstruct normals from depth instead of reading the normal buffer.
///
/// Reconstruction removes high-frequency detail carried by the source normals
/// at some extra cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NormalReconstruction {
    #[default]
    Disabled,
    Low,
    Medium,
    High,
}

/// Debug visualization drawn over the camera output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DebugMode {
    #[default]
    Disabled,
    /// Show the raw (blurred) occlusion term.
    AoOnly,
    /// Show the view-space normals the estimate pass works with.
    ViewNormal,
}

impl DebugMode {
    /// Returns true if a debug overlay should be drawn.
    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }
}

/// Screen-space ambient occlusion configuration.
///
/// Ranges listed on each field are what the configuration surface is
/// expected to enforce (see [`OcclusionSettings::clamped`]); the pipeline
/// itself uses the values as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcclusionSettings {
    /// Estimation algorithm.
    pub algorithm: Algorithm,
    /// Visibility sample density.
    pub quality: Quality,
    /// Intermediate buffer resolution.
    pub resolution: Resolution,
    /// Normal reconstruction from depth.
    pub reconstruct_normal: NormalReconstruction,
    /// Strength of the effect, 0 to 4. The pipeline is inactive at 0.
    pub intensity: f32,
    /// Sampling radius in world units, 0 to 10.
    pub radius: f32,
    /// Pixel-space sampling radius budget at 1920x1080, 16 to 512.
    pub max_radius_pixels: f32,
    /// Horizon angle bias compensating for over-occlusion, 0 to 0.99.
    pub bias: f32,
    /// Thin-object compensation used by GTAO, 0 to 1.
    pub thickness: f32,
    /// How much occlusion is applied to direct lighting, 0 to 1.
    pub direct_lighting_strength: f32,
    /// Distance beyond which occlusion fades out, at least 0.
    pub max_distance: f32,
    /// Length of the distance fade.
    pub distance_falloff: f32,
    /// Separable blur width.
    pub blur: BlurWidth,
    /// Edge preservation of the blur, 0 to 16.
    pub sharpness: f32,
    /// Debug visualization.
    pub debug_mode: DebugMode,
}

impl Default for OcclusionSettings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::GroundTruthBased,
            quality: Quality::Medium,
            resolution: Resolution::Full,
            reconstruct_normal: NormalReconstruction::Disabled,
            intensity: 0.0,
            radius: 0.8,
            max_radius_pixels: 128.0,
            bias: 0.5,
            thickness: 0.0,
            direct_lighting_strength: 0.25,
            max_distance: 150.0,
            distance_falloff: 50.0,
            blur: BlurWidth::X3,
            sharpness: 8.0,
            debug_mode: DebugMode::Disabled,
        }
    }
}

impl OcclusionSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the pipeline should run at all.
    ///
    /// `NaN` intensity counts as inactive.
    pub fn is_active(&self) -> bool {
        self.intensity > 0.0
    }

    /// Returns a copy with every ranged field clamped to its documented range.
    ///
    /// This is the configuration surface's job; the pipeline never calls it.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.intensity = self.intensity.clamp(0.0, 4.0);
        self.radius = self.radius.clamp(0.0, 10.0);
        self.max_radius_pixels = self.max_radius_pixels.clamp(16.0, 512.0);
        self.bias = self.bias.clamp(0.0, 0.99);
        self.thickness = self.thickness.clamp(0.0, 1.0);
        self.direct_lighting_strength = self.direct_lighting_strength.clamp(0.0, 1.0);
        self.max_distance = self.max_distance.max(0.0);
        self.sharpness = self.sharpness.clamp(0.0, 16.0);
        self
    }

    /// Sets the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the quality.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the buffer resolution.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the normal reconstruction mode.
    pub fn with_reconstruct_normal(mut self, reconstruct_normal: NormalReconstruction) -> Self {
        self.reconstruct_normal = reconstruct_normal;
        self
    }

    /// Sets the intensity.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Sets the world-space radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Sets the pixel radius budget.
    pub fn with_max_radius_pixels(mut self, max_radius_pixels: f32) -> Self {
        self.max_radius_pixels = max_radius_pixels;
        self
    }

    /// Sets the angle bias.
    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the blur width.
    pub fn with_blur(mut self, blur: BlurWidth) -> Self {
        self.blur = blur;
        self
    }

    /// Sets the debug mode.
    pub fn with_debug_mode(mut self, debug_mode: DebugMode) -> Self {
        self.debug_mode = debug_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = OcclusionSettings::default();
        assert_eq!(settings.algorithm, Algorithm::GroundTruthBased);
        assert_eq!(settings.quality, Quality::Medium);
        assert_eq!(settings.resolution, Resolution::Full);
        assert_eq!(settings.blur, BlurWidth::X3);
        assert_eq!(settings.intensity, 0.0);
        assert_eq!(settings.radius, 0.8);
        assert_eq!(settings.max_radius_pixels, 128.0);
        assert_eq!(settings.bias, 0.5);
        assert_eq!(settings.direct_lighting_strength, 0.25);
        assert!(!settings.is_active());
    }

    #[test]
    fn test_is_active() {
        assert!(OcclusionSettings::new().with_intensity(0.5).is_active());
        assert!(!OcclusionSettings::new().with_intensity(-1.0).is_active());
        assert!(!OcclusionSettings::new().with_intensity(f32::NAN).is_active());
    }

    #[test]
    fn test_clamped() {
        let settings = OcclusionSettings::new()
            .with_intensity(9.0)
            .with_bias(1.5)
            .with_max_radius_pixels(2.0)
            .with_radius(-1.0)
            .clamped();
        assert_eq!(settings.intensity, 4.0);
        assert_eq!(settings.bias, 0.99);
        assert_eq!(settings.max_radius_pixels, 16.0);
        assert_eq!(settings.radius, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: OcclusionSettings =
            serde_json::from_str(r#"{ "intensity": 1.5, "blur": "None" }"#).unwrap();
        assert_eq!(settings.intensity, 1.5);
        assert_eq!(settings.blur, BlurWidth::None);
        assert_eq!(settings.algorithm, Algorithm::GroundTruthBased);
        assert_eq!(settings.sharpness, 8.0);
    }

    #[test]
    fn test_enum_flags() {
        assert!(!BlurWidth::None.is_enabled());
        assert!(BlurWidth::X5.is_enabled());
        assert!(!DebugMode::Disabled.is_enabled());
        assert!(DebugMode::ViewNormal.is_enabled());
    }
}

//! Shader assembly.
//!
//! WGSL has no preprocessor, so a permutation is expressed as a header of
//! `const` declarations placed in front of the program body. Branches on
//! these constants are folded away by the shader compiler.

use occlusion_core::{AlgorithmTag, DebugTag, NormalTag, VariantKey};

use crate::error::{RenderError, RenderResult};

/// Source of the occlusion programs (estimate, blur, composite).
pub const OCCLUSION_SHADER: &str = include_str!("shaders/occlusion.wgsl");

/// Source of the pass-through copy program.
pub const COPY_SHADER: &str = include_str!("shaders/copy.wgsl");

/// Builds the specialisation header for a permutation.
pub fn permutation_header(key: &VariantKey) -> String {
    let algorithm = match key.algorithm {
        AlgorithmTag::Hbao => 0u32,
        AlgorithmTag::Gtao => 1,
        AlgorithmTag::Sao => 2,
    };
    let (directions, steps) = key.quality.sample_counts();
    let normals = match key.normals {
        NormalTag::None => 0u32,
        NormalTag::Low => 1,
        NormalTag::Medium => 2,
        NormalTag::High => 3,
    };
    let debug = match key.debug {
        DebugTag::None => 0u32,
        DebugTag::Ao => 1,
        DebugTag::ViewNormal => 2,
    };

    format!(
        "// {keywords}\n\
         const AO_ALGORITHM: u32 = {algorithm}u;\n\
         const AO_DIRECTIONS: u32 = {directions}u;\n\
         const AO_STEPS: u32 = {steps}u;\n\
         const BLUR_RADIUS: i32 = {blur};\n\
         const RECONSTRUCT_NORMAL: u32 = {normals}u;\n\
         const DEBUG_MODE: u32 = {debug}u;\n",
        keywords = key.keywords().join(" "),
        blur = key.blur.radius(),
    )
}

/// Builder for shader modules.
pub struct ShaderBuilder {
    source: Option<String>,
    header: Option<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            header: None,
            label: None,
        }
    }

    /// Sets the program body (WGSL).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Specialises the program for a permutation.
    #[must_use]
    pub fn with_permutation(mut self, key: &VariantKey) -> Self {
        self.header = Some(permutation_header(key));
        self
    }

    /// Sets the shader label for debugging.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds the shader module.
    pub fn build_module(self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.combined_source()?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Ok(module)
    }

    fn combined_source(&self) -> RenderResult<String> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| RenderError::ShaderCompilationFailed("missing shader source".into()))?;

        Ok(match &self.header {
            Some(header) => format!("{header}\n{source}"),
            None => source.clone(),
        })
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occlusion_core::{Algorithm, BlurWidth, DebugMode, OcclusionSettings, Quality};

    #[test]
    fn test_header_reflects_key() {
        let settings = OcclusionSettings::new()
            .with_algorithm(Algorithm::ScalableObscurance)
            .with_quality(Quality::Highest)
            .with_blur(BlurWidth::X5)
            .with_debug_mode(DebugMode::AoOnly);
        let header = permutation_header(&VariantKey::from_settings(&settings));
        assert!(header.contains("const AO_ALGORITHM: u32 = 2u;"));
        assert!(header.contains("const AO_DIRECTIONS: u32 = 8u;"));
        assert!(header.contains("const AO_STEPS: u32 = 6u;"));
        assert!(header.contains("const BLUR_RADIUS: i32 = 5;"));
        assert!(header.contains("const RECONSTRUCT_NORMAL: u32 = 0u;"));
        assert!(header.contains("const DEBUG_MODE: u32 = 1u;"));
        assert!(header.starts_with("// SCALABLE_AMBIENT_OBSCURANCE"));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let builder = ShaderBuilder::new().with_label("empty");
        assert!(builder.combined_source().is_err());
    }

    #[test]
    fn test_header_precedes_body() {
        let key = VariantKey::from_settings(&OcclusionSettings::default());
        let source = ShaderBuilder::new()
            .with_source(OCCLUSION_SHADER)
            .with_permutation(&key)
            .combined_source()
            .unwrap();
        let header_at = source.find("const AO_ALGORITHM").unwrap();
        let body_at = source.find("fn fs_estimate").unwrap();
        assert!(header_at < body_at);
    }
}

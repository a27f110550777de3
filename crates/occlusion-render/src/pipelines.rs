//! Render pipelines for the occlusion passes.
//!
//! Pipelines are created lazily, one per (pass, permutation, target format),
//! and kept for the lifetime of the backend.

use std::collections::HashMap;

use occlusion_core::{PermutationId, ShaderPass, VariantKey};

use crate::error::RenderResult;
use crate::shader::{ShaderBuilder, COPY_SHADER, OCCLUSION_SHADER};

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Fragment entry point of each occlusion pass.
pub fn entry_point(pass: ShaderPass) -> &'static str {
    match pass {
        ShaderPass::Estimate => "fs_estimate",
        ShaderPass::BlurHorizontal => "fs_blur_h",
        ShaderPass::BlurVertical => "fs_blur_v",
        ShaderPass::Composite => "fs_composite",
    }
}

/// Bind group layouts, sampler and pipeline caches.
pub struct OcclusionPipelines {
    occlusion_layout: wgpu::BindGroupLayout,
    occlusion_pipeline_layout: wgpu::PipelineLayout,
    copy_layout: wgpu::BindGroupLayout,
    copy_pipeline_layout: wgpu::PipelineLayout,
    copy_shader: wgpu::ShaderModule,
    sampler: wgpu::Sampler,
    modules: HashMap<PermutationId, wgpu::ShaderModule>,
    occlusion_pipelines: HashMap<(ShaderPass, PermutationId, wgpu::TextureFormat), wgpu::RenderPipeline>,
    copy_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl OcclusionPipelines {
    pub fn new(device: &wgpu::Device) -> RenderResult<Self> {
        let float = wgpu::TextureSampleType::Float { filterable: true };

        let occlusion_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Occlusion Bind Group Layout"),
            entries: &[
                // Source (camera color or an occlusion buffer)
                texture_entry(0, float),
                sampler_entry(1),
                // Scene depth, loaded texel by texel
                texture_entry(2, wgpu::TextureSampleType::Float { filterable: false }),
                // View-space normals
                texture_entry(3, float),
                // Rotation noise
                texture_entry(4, float),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let occlusion_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Occlusion Pipeline Layout"),
                bind_group_layouts: &[&occlusion_layout],
                push_constant_ranges: &[],
            });

        let copy_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Occlusion Copy Bind Group Layout"),
            entries: &[texture_entry(0, float), sampler_entry(1)],
        });

        let copy_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Occlusion Copy Pipeline Layout"),
            bind_group_layouts: &[&copy_layout],
            push_constant_ranges: &[],
        });

        let copy_shader = ShaderBuilder::new()
            .with_source(COPY_SHADER)
            .with_label("Occlusion Copy Shader")
            .build_module(device)?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Occlusion Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        Ok(Self {
            occlusion_layout,
            occlusion_pipeline_layout,
            copy_layout,
            copy_pipeline_layout,
            copy_shader,
            sampler,
            modules: HashMap::new(),
            occlusion_pipelines: HashMap::new(),
            copy_pipelines: HashMap::new(),
        })
    }

    #[must_use]
    pub fn occlusion_layout(&self) -> &wgpu::BindGroupLayout {
        &self.occlusion_layout
    }

    #[must_use]
    pub fn copy_layout(&self) -> &wgpu::BindGroupLayout {
        &self.copy_layout
    }

    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Number of specialised pipelines created so far.
    #[must_use]
    pub fn cached_pipeline_count(&self) -> usize {
        self.occlusion_pipelines.len()
    }

    /// Returns the pipeline for one occlusion pass, creating it on first use.
    pub fn occlusion_pipeline(
        &mut self,
        device: &wgpu::Device,
        pass: ShaderPass,
        id: PermutationId,
        key: &VariantKey,
        format: wgpu::TextureFormat,
    ) -> RenderResult<&wgpu::RenderPipeline> {
        let cache_key = (pass, id, format);
        if !self.occlusion_pipelines.contains_key(&cache_key) {
            if !self.modules.contains_key(&id) {
                let module = ShaderBuilder::new()
                    .with_source(OCCLUSION_SHADER)
                    .with_permutation(key)
                    .with_label(format!("Occlusion Shader #{}", id.index()))
                    .build_module(device)?;
                log::debug!("compiled occlusion permutation {} ({:?})", id.index(), key);
                self.modules.insert(id, module);
            }
            let module = &self.modules[&id];
            let pipeline = create_fullscreen_pipeline(
                device,
                pass.label(),
                &self.occlusion_pipeline_layout,
                module,
                entry_point(pass),
                format,
            );
            self.occlusion_pipelines.insert(cache_key, pipeline);
        }
        Ok(&self.occlusion_pipelines[&cache_key])
    }

    /// Returns the copy pipeline writing to `format`, creating it on first use.
    pub fn copy_pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let layout = &self.copy_pipeline_layout;
        let module = &self.copy_shader;
        self.copy_pipelines.entry(format).or_insert_with(|| {
            create_fullscreen_pipeline(device, "Occlusion Copy", layout, module, "fs_main", format)
        })
    }
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

//! wgpu implementation of [`OcclusionBackend`].

use glam::Mat4;
use occlusion_core::{
    Blit, BlitProgram, BlitSource, BlitTarget, BufferDescriptor, BufferSlot, OcclusionBackend,
    PermutationTable,
};
use wgpu::util::DeviceExt;

use crate::context::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::globals::GlobalRegistry;
use crate::pipelines::OcclusionPipelines;
use crate::texture::{create_flat_normal_texture, create_noise_texture, GpuTexture};
use crate::uniforms::OcclusionUniforms;

/// Depth linearisation terms `(m22, m32)` of a 0..1 depth projection.
///
/// View distance is recovered as `m32 / (depth + m22)`.
pub fn z_buffer_params(projection: &Mat4) -> [f32; 2] {
    [projection.z_axis.z, projection.w_axis.z]
}

/// Host textures bound for one camera's frame.
#[derive(Debug, Clone)]
pub struct FrameInputs {
    /// Resolved camera color; also the debug overlay's destination.
    pub color: wgpu::TextureView,
    pub color_format: wgpu::TextureFormat,
    /// Single-sampled depth.
    pub depth: wgpu::TextureView,
    /// View-space normals, when the host renders them.
    pub normals: Option<wgpu::TextureView>,
    pub z_buffer_params: [f32; 2],
}

impl FrameInputs {
    pub fn new(
        color: wgpu::TextureView,
        color_format: wgpu::TextureFormat,
        depth: wgpu::TextureView,
        projection: &Mat4,
    ) -> Self {
        Self {
            color,
            color_format,
            depth,
            normals: None,
            z_buffer_params: z_buffer_params(projection),
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: wgpu::TextureView) -> Self {
        self.normals = Some(normals);
        self
    }
}

struct FrameState {
    inputs: FrameInputs,
    encoder: wgpu::CommandEncoder,
    uniforms: Option<(OcclusionUniforms, wgpu::Buffer)>,
    scope_depth: u32,
}

/// Records occlusion passes into a wgpu command encoder.
///
/// Call [`begin_frame`](Self::begin_frame) before running a camera's passes
/// and [`finish_frame`](Self::finish_frame) to submit them.
pub struct WgpuBackend {
    context: GpuContext,
    pipelines: OcclusionPipelines,
    permutations: PermutationTable,
    noise_view: wgpu::TextureView,
    flat_normal_view: wgpu::TextureView,
    globals: GlobalRegistry,
    frame: Option<FrameState>,
}

impl WgpuBackend {
    pub fn new(context: GpuContext) -> RenderResult<Self> {
        let pipelines = OcclusionPipelines::new(&context.device)?;
        let noise_view = create_noise_texture(&context.device, &context.queue);
        let flat_normal_view = create_flat_normal_texture(&context.device, &context.queue);

        Ok(Self {
            context,
            pipelines,
            permutations: PermutationTable::new(),
            noise_view,
            flat_normal_view,
            globals: GlobalRegistry::new(),
            frame: None,
        })
    }

    #[must_use]
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    #[must_use]
    pub fn globals(&self) -> &GlobalRegistry {
        &self.globals
    }

    #[must_use]
    pub fn pipelines(&self) -> &OcclusionPipelines {
        &self.pipelines
    }

    #[must_use]
    pub fn is_frame_in_progress(&self) -> bool {
        self.frame.is_some()
    }

    /// Starts recording a frame against the given host textures.
    ///
    /// An unfinished frame is dropped without being submitted.
    pub fn begin_frame(&mut self, inputs: FrameInputs) {
        if self.frame.is_some() {
            log::warn!("begin_frame called with a frame in progress; discarding it");
        }
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Occlusion Encoder"),
            });
        self.frame = Some(FrameState {
            inputs,
            encoder,
            uniforms: None,
            scope_depth: 0,
        });
    }

    /// Submits the recorded frame.
    pub fn finish_frame(&mut self) -> RenderResult<wgpu::SubmissionIndex> {
        let frame = self.frame.take().ok_or(RenderError::NoFrameInProgress)?;
        if frame.scope_depth != 0 {
            log::warn!("{} debug scope(s) left open at submit", frame.scope_depth);
        }
        Ok(self.context.queue.submit(Some(frame.encoder.finish())))
    }

    fn record_blit(&mut self, blit: &Blit<'_, GpuTexture>) -> RenderResult<()> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoFrameInProgress)?;
        let device = &self.context.device;

        let source = match blit.source {
            BlitSource::CameraColor => &frame.inputs.color,
            BlitSource::Buffer(texture) => texture.view(),
        };
        let (target, format, load) = match blit.target {
            BlitTarget::CameraColor => (
                &frame.inputs.color,
                frame.inputs.color_format,
                wgpu::LoadOp::Load,
            ),
            BlitTarget::Buffer(texture) => (
                texture.view(),
                texture.format(),
                wgpu::LoadOp::Clear(wgpu::Color::WHITE),
            ),
        };

        let (pipeline, bind_group) = match blit.program {
            BlitProgram::Occlusion {
                pass,
                permutation,
                params,
            } => {
                let key = self.permutations.key(permutation).ok_or_else(|| {
                    RenderError::Validation(format!("unknown permutation {}", permutation.index()))
                })?;

                let [m22, m32] = frame.inputs.z_buffer_params;
                let uniforms = OcclusionUniforms::from(params).with_z_buffer_params(m22, m32);
                let reuse = matches!(&frame.uniforms, Some((last, _)) if *last == uniforms);
                if !reuse {
                    // A fresh buffer per distinct value; queue writes would all
                    // land before the encoder executes.
                    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Occlusion Uniform Buffer"),
                        contents: bytemuck::cast_slice(&[uniforms]),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                    frame.uniforms = Some((uniforms, buffer));
                }
                let Some((_, uniform_buffer)) = frame.uniforms.as_ref() else {
                    return Err(RenderError::Validation("uniform buffer missing".into()));
                };

                let normals = frame.inputs.normals.as_ref().unwrap_or(&self.flat_normal_view);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Occlusion Bind Group"),
                    layout: self.pipelines.occlusion_layout(),
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(source),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(self.pipelines.sampler()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(&frame.inputs.depth),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::TextureView(normals),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: wgpu::BindingResource::TextureView(&self.noise_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 5,
                            resource: uniform_buffer.as_entire_binding(),
                        },
                    ],
                });
                let pipeline =
                    self.pipelines
                        .occlusion_pipeline(device, pass, permutation, key, format)?;
                (pipeline, bind_group)
            }
            BlitProgram::Copy => {
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Occlusion Copy Bind Group"),
                    layout: self.pipelines.copy_layout(),
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(source),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(self.pipelines.sampler()),
                        },
                    ],
                });
                (self.pipelines.copy_pipeline(device, format), bind_group)
            }
        };

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(blit.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);

        Ok(())
    }
}

impl OcclusionBackend for WgpuBackend {
    type Texture = GpuTexture;

    fn allocate_texture(&mut self, descriptor: &BufferDescriptor, slot: BufferSlot) -> GpuTexture {
        log::debug!(
            "allocating {} {}x{} {:?}",
            slot.label(),
            descriptor.width,
            descriptor.height,
            descriptor.format
        );
        GpuTexture::new(&self.context.device, descriptor, slot)
    }

    fn release_texture(&mut self, texture: GpuTexture) {
        texture.destroy();
    }

    fn blit(&mut self, blit: &Blit<'_, GpuTexture>) {
        if let Err(err) = self.record_blit(blit) {
            log::warn!("skipping blit '{}': {err}", blit.label);
        }
    }

    fn push_scope(&mut self, label: &'static str) {
        if let Some(frame) = self.frame.as_mut() {
            frame.encoder.push_debug_group(label);
            frame.scope_depth += 1;
        }
    }

    fn pop_scope(&mut self) {
        if let Some(frame) = self.frame.as_mut() {
            if frame.scope_depth > 0 {
                frame.encoder.pop_debug_group();
                frame.scope_depth -= 1;
            }
        }
    }

    fn set_global_texture(&mut self, name: &'static str, texture: &GpuTexture) {
        self.globals.set_texture(name, texture.view().clone());
    }

    fn clear_global_texture(&mut self, name: &'static str) {
        self.globals.clear_texture(name);
    }

    fn set_keyword(&mut self, name: &'static str, enabled: bool) {
        self.globals.set_keyword(name, enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_buffer_params_linearise_depth() {
        let (near, far) = (0.1, 100.0);
        let projection = Mat4::perspective_rh(1.0, 1.5, near, far);
        let [m22, m32] = z_buffer_params(&projection);

        for distance in [0.5f32, 2.0, 10.0, 75.0] {
            let clip = projection * glam::Vec4::new(0.0, 0.0, -distance, 1.0);
            let depth = clip.z / clip.w;
            let linear = m32 / (depth + m22);
            assert!((linear - distance).abs() < 1e-2 * distance, "{linear} vs {distance}");
        }
    }
}

//! Offscreen single-frame runner.
//!
//! Creates a headless GPU context, a cleared color and depth target, runs
//! one camera through [`OcclusionFeature`] on a [`WgpuBackend`] and reads
//! the results back. Useful for integration tests and smoke-testing a
//! settings file without a host renderer.

use glam::Mat4;
use occlusion_core::{
    BufferFormat, BufferSlot, CameraFrameContext, CameraTargetDescriptor, OcclusionSettings,
};
use occlusion_render::{
    read_rgba8, FrameInputs, GpuContext, RenderError, RenderResult, WgpuBackend,
};
use pollster::FutureExt;

use crate::config::SharedSettings;
use crate::feature::{CameraId, OcclusionFeature};
use crate::pipeline::EnqueuedPasses;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Description of the frame to render.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessFrame {
    pub width: u32,
    pub height: u32,
    pub projection: Mat4,
    pub world_to_camera: Mat4,
    /// Value the depth target is cleared to, in 0..1.
    pub clear_depth: f32,
}

impl HeadlessFrame {
    /// A 60 degree perspective camera at the origin.
    pub fn new(width: u32, height: u32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Self {
            width,
            height,
            projection: Mat4::perspective_rh(60f32.to_radians(), aspect, 0.1, 100.0),
            world_to_camera: Mat4::IDENTITY,
            clear_depth: 0.99,
        }
    }
}

/// Pixels read back after the frame.
#[derive(Debug, Clone)]
pub struct HeadlessOutput {
    pub enqueued: EnqueuedPasses,
    /// Camera color after the frame, RGBA8.
    pub color: Vec<u8>,
    /// Composite output, RGBA8; `None` when the pipeline was inactive.
    pub occlusion: Option<Vec<u8>>,
}

/// Renders one frame with the given settings.
pub fn render_headless(settings: OcclusionSettings, frame: &HeadlessFrame) -> RenderResult<HeadlessOutput> {
    let context = GpuContext::new_headless().block_on()?;
    render_with_context(context, settings, frame)
}

/// Like [`render_headless`], on an existing device.
///
/// Errors the device raises while the frame runs, including failed
/// pipeline builds, are returned rather than reaching the device's
/// uncaptured-error handler.
pub fn render_with_context(
    context: GpuContext,
    settings: OcclusionSettings,
    frame: &HeadlessFrame,
) -> RenderResult<HeadlessOutput> {
    let device = context.device.clone();
    capture_gpu_errors(&device, || render_frame(context, settings, frame))
}

/// Runs `f` inside validation and internal error scopes on `device`.
///
/// A captured device error takes precedence over the result of `f`.
pub fn capture_gpu_errors<R>(
    device: &wgpu::Device,
    f: impl FnOnce() -> RenderResult<R>,
) -> RenderResult<R> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    device.push_error_scope(wgpu::ErrorFilter::Internal);

    let result = f();

    // Scopes pop in reverse order
    let internal = device.pop_error_scope().block_on();
    let validation = device.pop_error_scope().block_on();

    if let Some(error) = validation {
        log::error!("GPU validation error: {error}");
        return Err(RenderError::Validation(error.to_string()));
    }
    if let Some(error) = internal {
        log::error!("GPU internal error: {error}");
        return Err(RenderError::Internal(error.to_string()));
    }
    result
}

fn render_frame(
    context: GpuContext,
    settings: OcclusionSettings,
    frame: &HeadlessFrame,
) -> RenderResult<HeadlessOutput> {
    let device = context.device.clone();
    let queue = context.queue.clone();

    let (color_texture, color_view) = create_target(&device, frame, COLOR_FORMAT, "Headless Color");
    let (_depth_texture, depth_view) = create_target(&device, frame, DEPTH_FORMAT, "Headless Depth");
    clear_targets(&device, &queue, &color_view, &depth_view, frame.clear_depth);

    let mut backend = WgpuBackend::new(context)?;
    let mut feature = OcclusionFeature::new(SharedSettings::new(settings));
    let camera = CameraId(0);
    let camera_frame = CameraFrameContext::new(
        frame.projection,
        frame.world_to_camera,
        CameraTargetDescriptor::new(frame.width, frame.height, BufferFormat::Rgba8Unorm),
    );

    backend.begin_frame(FrameInputs::new(
        color_view,
        COLOR_FORMAT,
        depth_view,
        &frame.projection,
    ));
    let enqueued = feature.render_camera(camera, &camera_frame, &mut backend);
    backend.finish_frame()?;

    let occlusion = match feature
        .pipeline(camera)
        .and_then(|pipeline| pipeline.targets().get(BufferSlot::Final))
    {
        Some(texture) => Some(read_rgba8(&device, &queue, texture.texture())?),
        None => None,
    };
    let color = read_rgba8(&device, &queue, &color_texture)?;

    feature.shutdown(&mut backend);

    Ok(HeadlessOutput {
        enqueued,
        color,
        occlusion,
    })
}

fn create_target(
    device: &wgpu::Device,
    frame: &HeadlessFrame,
    format: wgpu::TextureFormat,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: frame.width.max(1),
            height: frame.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn clear_targets(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    color: &wgpu::TextureView,
    depth: &wgpu::TextureView,
    clear_depth: f32,
) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Headless Clear Encoder"),
    });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Headless Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.5,
                        g: 0.5,
                        b: 0.5,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_depth),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
    }
    queue.submit(std::iter::once(encoder.finish()));
}

//! GPU textures backing the occlusion buffers.

use occlusion_core::{BufferDescriptor, BufferFormat, BufferSlot};

use crate::error::{RenderError, RenderResult};

/// Maps a buffer format to the wgpu texture format.
pub fn texture_format(format: BufferFormat) -> wgpu::TextureFormat {
    match format {
        BufferFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        BufferFormat::R16Float => wgpu::TextureFormat::R16Float,
        BufferFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        BufferFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

/// An allocated occlusion buffer.
#[derive(Debug)]
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    descriptor: BufferDescriptor,
}

impl GpuTexture {
    /// Creates a texture usable as both render attachment and shader input.
    ///
    /// Zero-sized descriptors are clamped to 1x1; wgpu rejects empty textures.
    pub fn new(device: &wgpu::Device, descriptor: &BufferDescriptor, slot: BufferSlot) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(slot.label()),
            size: wgpu::Extent3d {
                width: descriptor.width.max(1),
                height: descriptor.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: descriptor.sample_count.max(1),
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(descriptor.format),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            descriptor: *descriptor,
        }
    }

    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// The descriptor this texture was allocated with.
    #[must_use]
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        texture_format(self.descriptor.format)
    }

    /// Frees the GPU memory immediately.
    pub fn destroy(self) {
        self.texture.destroy();
    }
}

/// Creates the 4x4 rotation noise used to decorrelate sample directions.
pub fn create_noise_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let mut noise_data = Vec::with_capacity(4 * 4 * 4);

    for _ in 0..16 {
        let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        // Stored in [0,1]; the shader remaps to [-1,1]
        noise_data.push(unorm8(angle.cos() * 0.5 + 0.5));
        noise_data.push(unorm8(angle.sin() * 0.5 + 0.5));
        noise_data.push(0u8);
        noise_data.push(255u8);
    }

    let size = wgpu::Extent3d {
        width: 4,
        height: 4,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Occlusion Noise Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &noise_data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * 4),
            rows_per_image: Some(4),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Creates the 1x1 view-space normal bound when the host provides none.
pub fn create_flat_normal_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: 1,
        height: 1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Occlusion Flat Normal"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    // Unorm-encoded (0, 0, 1): facing the camera
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[128u8, 128, 255, 255],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Bytes per row padded to the copy alignment.
fn aligned_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * bytes_per_pixel).div_ceil(align) * align
}

/// Copies an `Rgba8Unorm` texture back to the CPU, row padding removed.
pub fn read_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> RenderResult<Vec<u8>> {
    if texture.format() != wgpu::TextureFormat::Rgba8Unorm {
        return Err(RenderError::Validation(format!(
            "readback expects Rgba8Unorm, got {:?}",
            texture.format()
        )));
    }

    let (width, height) = (texture.width(), texture.height());
    let bytes_per_row = aligned_bytes_per_row(width, 4);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Occlusion Readback Buffer"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Occlusion Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::wait_indefinitely())?;
    rx.recv()
        .map_err(|_| RenderError::BufferMapFailed)?
        .map_err(|_| RenderError::BufferMapFailed)?;

    let data = buffer_slice.get_mapped_range();
    let row_bytes = (width * 4) as usize;
    let mut result = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height {
        let start = (row * bytes_per_row) as usize;
        result.extend_from_slice(&data[start..start + row_bytes]);
    }
    drop(data);
    buffer.unmap();

    Ok(result)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mapping() {
        assert_eq!(
            texture_format(BufferFormat::Rgba16Float),
            wgpu::TextureFormat::Rgba16Float
        );
        assert_eq!(
            texture_format(BufferFormat::R8Unorm),
            wgpu::TextureFormat::R8Unorm
        );
    }

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(aligned_bytes_per_row(64, 4), 256);
        assert_eq!(aligned_bytes_per_row(65, 4), 512);
    }

    #[test]
    fn test_unorm8_clamps() {
        assert_eq!(unorm8(-1.0), 0);
        assert_eq!(unorm8(0.5), 128);
        assert_eq!(unorm8(2.0), 255);
    }
}

//! The fixed pass sequence of one camera.

use occlusion_core::{
    ActiveVariant, Blit, BlitProgram, BlitSource, BlitTarget, BufferDescriptor, BufferSlot,
    OcclusionBackend, OcclusionParams, ShaderPass, PROFILING_SCOPE, SCREEN_SPACE_OCCLUSION,
    SCREEN_SPACE_OCCLUSION_TEXTURE,
};

use crate::render_targets::RenderTargetManager;

/// Issues estimate, blur and composite for one camera and publishes the
/// result.
///
/// The frame is split into the host's three hooks: [`setup`](Self::setup)
/// before recording, [`execute`](Self::execute) to record passes and
/// [`cleanup`](Self::cleanup) once the camera has rendered.
pub struct PassSequencer<T> {
    targets: RenderTargetManager<T>,
}

impl<T> PassSequencer<T> {
    pub fn new() -> Self {
        Self {
            targets: RenderTargetManager::new(),
        }
    }

    /// Raises the availability flag and brings the buffers up to date.
    pub fn setup<B>(&mut self, descriptor: &BufferDescriptor, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        backend.set_keyword(SCREEN_SPACE_OCCLUSION, true);
        self.targets.ensure(descriptor, backend);
    }

    /// Records the passes. Does nothing until [`setup`](Self::setup) has run.
    pub fn execute<B>(
        &self,
        variant: &ActiveVariant,
        params: &OcclusionParams,
        blur: bool,
        backend: &mut B,
    ) where
        B: OcclusionBackend<Texture = T>,
    {
        let Some((final_buffer, raw, temp)) = self.targets.buffers() else {
            log::warn!("occlusion passes skipped: buffers not set up");
            return;
        };

        let occlusion = |pass: ShaderPass| BlitProgram::Occlusion {
            pass,
            permutation: variant.id,
            params,
        };

        backend.push_scope(PROFILING_SCOPE);

        backend.blit(&Blit {
            source: BlitSource::CameraColor,
            target: BlitTarget::Buffer(raw),
            program: occlusion(ShaderPass::Estimate),
            label: ShaderPass::Estimate.label(),
        });

        if blur {
            backend.blit(&Blit {
                source: BlitSource::Buffer(raw),
                target: BlitTarget::Buffer(temp),
                program: occlusion(ShaderPass::BlurHorizontal),
                label: ShaderPass::BlurHorizontal.label(),
            });
            backend.blit(&Blit {
                source: BlitSource::Buffer(temp),
                target: BlitTarget::Buffer(raw),
                program: occlusion(ShaderPass::BlurVertical),
                label: ShaderPass::BlurVertical.label(),
            });
        }

        // Publishing binds the texture; it holds the composite once sampled.
        backend.set_global_texture(SCREEN_SPACE_OCCLUSION_TEXTURE, final_buffer);

        backend.blit(&Blit {
            source: BlitSource::Buffer(raw),
            target: BlitTarget::Buffer(final_buffer),
            program: occlusion(ShaderPass::Composite),
            label: ShaderPass::Composite.label(),
        });

        backend.pop_scope();

        log::trace!(
            "occlusion passes recorded (blur: {blur}, permutation: {})",
            variant.id.index()
        );
    }

    /// Lowers the availability flag and withdraws the published texture.
    pub fn cleanup<B>(&self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        backend.set_keyword(SCREEN_SPACE_OCCLUSION, false);
        backend.clear_global_texture(SCREEN_SPACE_OCCLUSION_TEXTURE);
    }

    /// Frees the buffers.
    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        self.targets.release(backend);
    }

    /// The raw occlusion buffer, which also holds the blurred result.
    pub fn raw_buffer(&self) -> Option<&T> {
        self.targets.get(BufferSlot::Raw)
    }

    pub fn targets(&self) -> &RenderTargetManager<T> {
        &self.targets
    }
}

impl<T> Default for PassSequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! Optional pass that shows an intermediate buffer instead of the lit image.

use occlusion_core::{Blit, BlitProgram, BlitSource, BlitTarget, BufferSlot, OcclusionBackend};

use crate::render_targets::RenderTargetManager;

/// Copies one of the pipeline's buffers onto the camera color target.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugOverlay {
    source: Option<BufferSlot>,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the buffer to display.
    pub fn setup(&mut self, source: BufferSlot) {
        self.source = Some(source);
    }

    /// Unbinds the source; subsequent executes are no-ops.
    pub fn reset(&mut self) {
        self.source = None;
    }

    pub fn source(&self) -> Option<BufferSlot> {
        self.source
    }

    /// Records the copy. Skipped when no source is bound or allocated.
    pub fn execute<B>(&self, targets: &RenderTargetManager<B::Texture>, backend: &mut B)
    where
        B: OcclusionBackend,
    {
        let Some(texture) = self.source.and_then(|slot| targets.get(slot)) else {
            log::warn!("occlusion debug overlay skipped: no source buffer");
            return;
        };

        backend.blit(&Blit {
            source: BlitSource::Buffer(texture),
            target: BlitTarget::CameraColor,
            program: BlitProgram::Copy,
            label: "Occlusion Debug",
        });
    }
}

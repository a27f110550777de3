//! Per-camera occlusion pipeline and its lifecycle.

use occlusion_core::{
    ActiveVariant, BufferDescriptor, BufferSlot, CameraFrameContext, OcclusionBackend,
    OcclusionParams, OcclusionSettings,
};

use crate::debug_overlay::DebugOverlay;
use crate::render_targets::RenderTargetManager;
use crate::sequencer::PassSequencer;

/// Lifecycle state of a camera's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Intensity is zero: no buffers, no passes.
    #[default]
    Inactive,
    /// Buffers allocated; passes issued every frame.
    Active,
    /// Removed. Terminal.
    TornDown,
}

/// Passes the host should schedule for a camera this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnqueuedPasses {
    pub occlusion: bool,
    pub debug: bool,
}

impl EnqueuedPasses {
    pub const NONE: Self = Self {
        occlusion: false,
        debug: false,
    };

    /// Decides the passes from settings alone.
    pub fn for_settings(settings: &OcclusionSettings) -> Self {
        let occlusion = settings.is_active();
        Self {
            occlusion,
            debug: occlusion && settings.debug_mode.is_enabled(),
        }
    }

    /// Number of render passes to enqueue.
    pub fn count(self) -> usize {
        usize::from(self.occlusion) + usize::from(self.debug)
    }
}

#[derive(Debug, Clone, Copy)]
struct PreparedFrame {
    variant: ActiveVariant,
    params: OcclusionParams,
    blur: bool,
    debug: bool,
}

/// Occlusion pipeline of a single camera.
///
/// Owns that camera's three buffers exclusively; cameras never share one.
pub struct OcclusionPipeline<T> {
    state: PipelineState,
    sequencer: PassSequencer<T>,
    overlay: DebugOverlay,
    prepared: Option<PreparedFrame>,
}

impl<T> OcclusionPipeline<T> {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Inactive,
            sequencer: PassSequencer::new(),
            overlay: DebugOverlay::new(),
            prepared: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn targets(&self) -> &RenderTargetManager<T> {
        self.sequencer.targets()
    }

    pub fn debug_overlay(&self) -> &DebugOverlay {
        &self.overlay
    }

    /// Per-camera setup: sizes buffers, derives parameters and binds the
    /// debug overlay.
    ///
    /// Going inactive releases the buffers immediately.
    pub fn setup<B>(
        &mut self,
        settings: &OcclusionSettings,
        variant: &ActiveVariant,
        frame: &CameraFrameContext,
        backend: &mut B,
    ) -> EnqueuedPasses
    where
        B: OcclusionBackend<Texture = T>,
    {
        if self.state == PipelineState::TornDown {
            log::warn!("setup on a torn down occlusion pipeline ignored");
            return EnqueuedPasses::NONE;
        }

        let enqueued = EnqueuedPasses::for_settings(settings);
        if !enqueued.occlusion {
            if self.state == PipelineState::Active {
                log::info!("occlusion pipeline inactive; releasing buffers");
                self.sequencer.release(backend);
                self.overlay.reset();
                self.state = PipelineState::Inactive;
            }
            self.prepared = None;
            return enqueued;
        }

        let descriptor = BufferDescriptor::for_occlusion(&frame.target, settings.resolution);
        self.sequencer.setup(&descriptor, backend);
        let params = OcclusionParams::derive(frame, settings, descriptor.width, descriptor.height);

        if enqueued.debug {
            self.overlay.setup(BufferSlot::Raw);
        } else {
            self.overlay.reset();
        }

        if self.state == PipelineState::Inactive {
            log::info!(
                "occlusion pipeline active at {}x{}",
                descriptor.width,
                descriptor.height
            );
            self.state = PipelineState::Active;
        }

        self.prepared = Some(PreparedFrame {
            variant: *variant,
            params,
            blur: settings.blur.is_enabled(),
            debug: enqueued.debug,
        });
        enqueued
    }

    /// Records the enqueued passes, debug overlay last.
    pub fn execute<B>(&self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        let Some(frame) = self.prepared.as_ref() else {
            return;
        };
        self.sequencer
            .execute(&frame.variant, &frame.params, frame.blur, backend);
        if frame.debug {
            self.overlay.execute(self.sequencer.targets(), backend);
        }
    }

    /// Per-camera cleanup after the camera has rendered.
    pub fn cleanup<B>(&mut self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        if self.prepared.take().is_some() {
            self.sequencer.cleanup(backend);
        }
    }

    /// Releases everything; the pipeline cannot be used afterwards.
    pub fn teardown<B>(&mut self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        if self.state == PipelineState::TornDown {
            return;
        }
        self.sequencer.cleanup(backend);
        self.prepared = None;
        self.sequencer.release(backend);
        self.overlay.reset();
        self.state = PipelineState::TornDown;
        log::info!("occlusion pipeline torn down");
    }
}

impl<T> Default for OcclusionPipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use occlusion_core::{
        BufferFormat, CameraTargetDescriptor, DebugMode, Mat4, VariantSelector,
    };

    fn frame() -> CameraFrameContext {
        CameraFrameContext::new(
            Mat4::perspective_rh(1.0, 4.0 / 3.0, 0.1, 100.0),
            Mat4::IDENTITY,
            CameraTargetDescriptor::new(640, 480, BufferFormat::Rgba16Float),
        )
    }

    #[test]
    fn test_enqueued_passes() {
        let off = OcclusionSettings::new();
        assert_eq!(EnqueuedPasses::for_settings(&off).count(), 0);
        // Debug alone does nothing while inactive
        let debug_only = off.with_debug_mode(DebugMode::AoOnly);
        assert_eq!(EnqueuedPasses::for_settings(&debug_only), EnqueuedPasses::NONE);
        let on = debug_only.with_intensity(1.0);
        assert_eq!(EnqueuedPasses::for_settings(&on).count(), 2);
    }

    #[test]
    fn test_state_transitions() {
        let mut backend = RecordingBackend::new();
        let mut selector = VariantSelector::new();
        let mut pipeline = OcclusionPipeline::new();
        assert_eq!(pipeline.state(), PipelineState::Inactive);

        let on = OcclusionSettings::new().with_intensity(1.0);
        let variant = selector.select(&on);
        pipeline.setup(&on, &variant, &frame(), &mut backend);
        assert_eq!(pipeline.state(), PipelineState::Active);
        assert_eq!(backend.live_textures(), 3);
        pipeline.cleanup(&mut backend);

        let off = on.with_intensity(0.0);
        let enqueued = pipeline.setup(&off, &variant, &frame(), &mut backend);
        assert_eq!(enqueued, EnqueuedPasses::NONE);
        assert_eq!(pipeline.state(), PipelineState::Inactive);
        assert_eq!(backend.live_textures(), 0);

        pipeline.setup(&on, &variant, &frame(), &mut backend);
        pipeline.teardown(&mut backend);
        assert_eq!(pipeline.state(), PipelineState::TornDown);
        assert_eq!(backend.live_textures(), 0);

        let enqueued = pipeline.setup(&on, &variant, &frame(), &mut backend);
        assert_eq!(enqueued, EnqueuedPasses::NONE);
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn test_execute_without_setup_is_silent() {
        let mut backend = RecordingBackend::new();
        let pipeline: OcclusionPipeline<_> = OcclusionPipeline::new();
        pipeline.execute(&mut backend);
        assert!(backend.commands().is_empty());
    }
}

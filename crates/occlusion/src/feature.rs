//! Host-facing entry point: one pipeline per camera, driven by shared settings.

use std::collections::HashMap;

use occlusion_core::{
    CameraFrameContext, OcclusionBackend, OcclusionError, OcclusionSettings, Result,
    VariantSelector,
};

use crate::config::SharedSettings;
use crate::pipeline::{EnqueuedPasses, OcclusionPipeline, PipelineState};

/// Host identifier of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u64);

/// Screen-space occlusion for every camera a host renders.
///
/// # Example
///
/// ```
/// use occlusion::*;
///
/// let settings = SharedSettings::new(OcclusionSettings::new().with_intensity(1.0));
/// let mut feature = OcclusionFeature::new(settings);
/// let mut backend = RecordingBackend::new();
///
/// let frame = CameraFrameContext::new(
///     Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0),
///     Mat4::IDENTITY,
///     CameraTargetDescriptor::new(1280, 720, BufferFormat::Rgba16Float),
/// );
/// let enqueued = feature.render_camera(CameraId(0), &frame, &mut backend);
/// assert!(enqueued.occlusion);
/// assert!(!backend.is_keyword_enabled(SCREEN_SPACE_OCCLUSION));
/// ```
pub struct OcclusionFeature<T> {
    settings: SharedSettings,
    selector: VariantSelector,
    pipelines: HashMap<CameraId, OcclusionPipeline<T>>,
}

impl<T> OcclusionFeature<T> {
    pub fn new(settings: SharedSettings) -> Self {
        Self {
            settings,
            selector: VariantSelector::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Handle for the configuration surface.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Passes the current settings would enqueue for any camera.
    pub fn add_render_passes(&self) -> EnqueuedPasses {
        EnqueuedPasses::for_settings(&self.settings.snapshot())
    }

    /// Starts a camera's frame.
    ///
    /// Settings are snapshotted once here. The returned scope records the
    /// passes on [`execute`](CameraFrameScope::execute) and runs the
    /// camera's cleanup when dropped, on every exit path.
    pub fn begin_camera<'a, B>(
        &'a mut self,
        camera: CameraId,
        frame: &CameraFrameContext,
        backend: &'a mut B,
    ) -> CameraFrameScope<'a, B>
    where
        B: OcclusionBackend<Texture = T>,
    {
        let settings = self.settings.snapshot();
        let variant = self.selector.select(&settings);

        let pipeline = self.pipelines.entry(camera).or_insert_with(|| {
            log::info!("creating occlusion pipeline for camera {}", camera.0);
            OcclusionPipeline::new()
        });
        let enqueued = pipeline.setup(&settings, &variant, frame, &mut *backend);

        CameraFrameScope {
            pipeline,
            backend,
            settings,
            enqueued,
            executed: false,
        }
    }

    /// Runs a camera's whole frame: setup, passes, cleanup.
    pub fn render_camera<B>(
        &mut self,
        camera: CameraId,
        frame: &CameraFrameContext,
        backend: &mut B,
    ) -> EnqueuedPasses
    where
        B: OcclusionBackend<Texture = T>,
    {
        let mut scope = self.begin_camera(camera, frame, backend);
        scope.execute();
        let enqueued = scope.enqueued();
        drop(scope);
        enqueued
    }

    /// Tears down and forgets a camera's pipeline.
    pub fn remove_camera<B>(&mut self, camera: CameraId, backend: &mut B) -> Result<()>
    where
        B: OcclusionBackend<Texture = T>,
    {
        let mut pipeline = self
            .pipelines
            .remove(&camera)
            .ok_or(OcclusionError::UnknownCamera(camera.0))?;
        pipeline.teardown(backend);
        Ok(())
    }

    /// Tears down every pipeline.
    pub fn shutdown<B>(&mut self, backend: &mut B)
    where
        B: OcclusionBackend<Texture = T>,
    {
        let count = self.pipelines.len();
        for (_, mut pipeline) in self.pipelines.drain() {
            pipeline.teardown(&mut *backend);
        }
        if count > 0 {
            log::info!("occlusion feature shut down ({count} camera(s))");
        }
    }

    pub fn camera_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn pipeline(&self, camera: CameraId) -> Option<&OcclusionPipeline<T>> {
        self.pipelines.get(&camera)
    }

    /// State of a camera's pipeline, if it has one.
    pub fn camera_state(&self, camera: CameraId) -> Option<PipelineState> {
        self.pipelines.get(&camera).map(OcclusionPipeline::state)
    }
}

/// One camera's frame in progress.
///
/// Dropping the scope runs the camera's cleanup: the availability keyword
/// is lowered and the published texture withdrawn.
pub struct CameraFrameScope<'a, B: OcclusionBackend> {
    pipeline: &'a mut OcclusionPipeline<B::Texture>,
    backend: &'a mut B,
    settings: OcclusionSettings,
    enqueued: EnqueuedPasses,
    executed: bool,
}

impl<B: OcclusionBackend> CameraFrameScope<'_, B> {
    /// Passes scheduled for this camera.
    pub fn enqueued(&self) -> EnqueuedPasses {
        self.enqueued
    }

    /// The settings snapshot taken for this frame.
    pub fn settings(&self) -> &OcclusionSettings {
        &self.settings
    }

    /// Records the scheduled passes. Only the first call records anything.
    pub fn execute(&mut self) {
        if self.executed {
            log::warn!("occlusion passes already recorded for this camera frame");
            return;
        }
        self.executed = true;
        self.pipeline.execute(&mut *self.backend);
    }

    /// Backend access for host work recorded inside the camera's frame.
    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }
}

impl<B: OcclusionBackend> Drop for CameraFrameScope<'_, B> {
    fn drop(&mut self) {
        self.pipeline.cleanup(&mut *self.backend);
    }
}

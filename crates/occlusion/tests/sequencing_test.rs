//! Pass sequencing and buffer lifecycle tests.
//!
//! These drive the full feature against the recording backend, so they
//! need no GPU.

use occlusion::*;
use proptest::prelude::*;

fn camera_frame(width: u32, height: u32) -> CameraFrameContext {
    CameraFrameContext::new(
        Mat4::perspective_rh(1.0, width as f32 / height as f32, 0.1, 500.0),
        Mat4::from_translation(glam::Vec3::new(0.0, -1.0, -5.0)),
        CameraTargetDescriptor::new(width, height, BufferFormat::Rgba16Float)
            .with_sample_count(4)
            .with_depth_bits(32),
    )
}

fn feature_with(settings: OcclusionSettings) -> OcclusionFeature<TextureHandle> {
    OcclusionFeature::new(SharedSettings::new(settings))
}

fn occlusion_params(backend: &RecordingBackend) -> Vec<OcclusionParams> {
    backend
        .blits()
        .filter_map(|b| match b.program {
            RecordedProgram::Occlusion { params, .. } => Some(params),
            RecordedProgram::Copy => None,
        })
        .collect()
}

#[test]
fn test_inactive_issues_nothing() {
    for intensity in [0.0, -1.0, f32::NAN] {
        let mut feature = feature_with(OcclusionSettings::new().with_intensity(intensity));
        let mut backend = RecordingBackend::new();
        let enqueued = feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);

        assert_eq!(enqueued, EnqueuedPasses::NONE);
        assert_eq!(feature.add_render_passes().count(), 0);
        assert!(backend.commands().is_empty(), "intensity {intensity}");
        assert_eq!(backend.live_textures(), 0);
    }
}

#[test]
fn test_debug_without_intensity_issues_nothing() {
    let settings = OcclusionSettings::new().with_debug_mode(DebugMode::AoOnly);
    let mut feature = feature_with(settings);
    let mut backend = RecordingBackend::new();
    feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);
    assert!(backend.commands().is_empty());
}

#[test]
fn test_no_blur_sequence() {
    let settings = OcclusionSettings::new()
        .with_intensity(1.0)
        .with_blur(BlurWidth::None);
    let mut feature = feature_with(settings);
    let mut backend = RecordingBackend::new();
    feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);

    assert_eq!(
        backend.passes(),
        vec![ShaderPass::Estimate, ShaderPass::Composite]
    );

    let blits: Vec<_> = backend.blits().cloned().collect();
    // Composite reads exactly what the estimate wrote
    assert_eq!(blits[0].target, blits[1].source);
    assert_eq!(blits[0].source, Endpoint::CameraColor);
}

#[test]
fn test_blur_widths_add_two_passes() {
    for blur in [BlurWidth::X2, BlurWidth::X3, BlurWidth::X4, BlurWidth::X5] {
        let settings = OcclusionSettings::new().with_intensity(1.0).with_blur(blur);
        let mut feature = feature_with(settings);
        let mut backend = RecordingBackend::new();
        feature.render_camera(CameraId(0), &camera_frame(640, 360), &mut backend);

        assert_eq!(
            backend.passes(),
            vec![
                ShaderPass::Estimate,
                ShaderPass::BlurHorizontal,
                ShaderPass::BlurVertical,
                ShaderPass::Composite,
            ],
            "{blur:?}"
        );

        let blits: Vec<_> = backend.blits().cloned().collect();
        let raw = blits[0].target;
        assert_eq!(blits[1].source, raw);
        assert_eq!(blits[2].target, raw);
        assert_eq!(blits[3].source, raw);
    }
}

#[test]
fn test_final_buffer_written_only_by_composite() {
    let settings = OcclusionSettings::new()
        .with_intensity(2.0)
        .with_debug_mode(DebugMode::AoOnly);
    let mut feature = feature_with(settings);
    let mut backend = RecordingBackend::new();
    feature.render_camera(CameraId(0), &camera_frame(640, 360), &mut backend);

    let final_handle = backend
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::Allocate {
                texture,
                slot: BufferSlot::Final,
                ..
            } => Some(*texture),
            _ => None,
        })
        .unwrap();
    let (slot, descriptor) = backend.texture_info(final_handle).unwrap();
    assert_eq!(*slot, BufferSlot::Final);
    assert_eq!((descriptor.width, descriptor.height), (640, 360));

    let writers: Vec<_> = backend
        .blits()
        .filter(|b| b.target == Endpoint::Buffer(final_handle))
        .map(RecordedBlit::pass)
        .collect();
    assert_eq!(writers, vec![Some(ShaderPass::Composite)]);
}

#[test]
fn test_debug_overlay_is_one_terminal_pass() {
    for blur in [BlurWidth::None, BlurWidth::X4] {
        for debug in [DebugMode::AoOnly, DebugMode::ViewNormal] {
            let settings = OcclusionSettings::new()
                .with_intensity(1.0)
                .with_blur(blur)
                .with_debug_mode(debug);
            let mut feature = feature_with(settings);
            let mut backend = RecordingBackend::new();
            let enqueued =
                feature.render_camera(CameraId(0), &camera_frame(320, 200), &mut backend);

            assert!(enqueued.debug);
            assert_eq!(enqueued.count(), 2);
            let expected_passes = if blur.is_enabled() { 4 } else { 2 };
            assert_eq!(backend.blit_count(), expected_passes + 1);

            let last = backend.blits().last().cloned().unwrap();
            assert_eq!(last.program, RecordedProgram::Copy);
            assert_eq!(last.target, Endpoint::CameraColor);
            let raw = backend.blits().next().unwrap().target;
            assert_eq!(last.source, raw);
            let Endpoint::Buffer(source) = last.source else {
                panic!("overlay must read an occlusion buffer");
            };
            assert_eq!(backend.slot_of(source), Some(BufferSlot::Raw));
            let overlay = feature.pipeline(CameraId(0)).unwrap().debug_overlay();
            assert_eq!(overlay.source(), Some(BufferSlot::Raw));
        }
    }
}

#[test]
fn test_half_resolution_buffers() {
    let settings = OcclusionSettings::new()
        .with_intensity(1.0)
        .with_resolution(Resolution::Half);
    let mut feature = feature_with(settings);
    let mut backend = RecordingBackend::new();
    feature.render_camera(CameraId(0), &camera_frame(1001, 777), &mut backend);

    let pipeline = feature.pipeline(CameraId(0)).unwrap();
    for slot in BufferSlot::ALL {
        let desc = pipeline.targets().descriptor(slot).unwrap();
        assert_eq!((desc.width, desc.height), (500, 388));
        assert_eq!(desc.sample_count, 1);
        assert_eq!(desc.depth_bits, 0);
        assert_eq!(desc.filter, FilterMode::Bilinear);
    }
}

#[test]
fn test_end_to_end_scenario() {
    let settings = OcclusionSettings::new()
        .with_intensity(1.0)
        .with_resolution(Resolution::Half)
        .with_radius(0.8)
        .with_bias(0.5)
        .with_max_radius_pixels(128.0)
        .with_blur(BlurWidth::X3)
        .with_debug_mode(DebugMode::Disabled);
    let mut feature = feature_with(settings);
    let mut backend = RecordingBackend::new();
    let camera = CameraId(7);

    {
        let mut scope = feature.begin_camera(camera, &camera_frame(1920, 1080), &mut backend);
        assert!(scope.backend().is_keyword_enabled(SCREEN_SPACE_OCCLUSION));
        scope.execute();
        assert!(scope.backend().is_keyword_enabled(SCREEN_SPACE_OCCLUSION));
        let published = scope.backend().global_texture(SCREEN_SPACE_OCCLUSION_TEXTURE);
        assert!(published.is_some());
    }
    assert!(!backend.is_keyword_enabled(SCREEN_SPACE_OCCLUSION));
    assert!(backend.global_texture(SCREEN_SPACE_OCCLUSION_TEXTURE).is_none());

    let pipeline = feature.pipeline(camera).unwrap();
    let desc = pipeline.targets().descriptor(BufferSlot::Raw).unwrap();
    assert_eq!((desc.width, desc.height), (960, 540));

    assert_eq!(
        backend.passes(),
        vec![
            ShaderPass::Estimate,
            ShaderPass::BlurHorizontal,
            ShaderPass::BlurVertical,
            ShaderPass::Composite,
        ]
    );

    let params = occlusion_params(&backend);
    assert_eq!(params.len(), 4);
    for p in &params {
        assert!((p.max_radius_pixels - 128.0).abs() < 1e-3);
        assert!((p.ao_multiplier - 4.0).abs() < 1e-5);
        assert!((p.target_scale.x - 1920.5 / 1920.0).abs() < 1e-6);
        assert!((p.target_scale.y - 1080.5 / 1080.0).abs() < 1e-6);
        assert_eq!(p.scaled_texel_size.z, 960.0);
        assert_eq!(p.full_texel_size.z, 1920.0);
    }

    feature.remove_camera(camera, &mut backend).unwrap();
    assert_eq!(backend.live_textures(), 0);
    assert!(!backend.is_keyword_enabled(SCREEN_SPACE_OCCLUSION));
}

#[test]
fn test_scope_cleans_up_without_execute() {
    let mut feature = feature_with(OcclusionSettings::new().with_intensity(1.0));
    let mut backend = RecordingBackend::new();
    {
        let scope = feature.begin_camera(CameraId(0), &camera_frame(64, 64), &mut backend);
        assert!(scope.enqueued().occlusion);
        // Early return: passes never recorded
    }
    assert!(!backend.is_keyword_enabled(SCREEN_SPACE_OCCLUSION));
    assert_eq!(backend.blit_count(), 0);
}

#[test]
fn test_steady_state_does_not_reallocate() {
    let mut feature = feature_with(OcclusionSettings::new().with_intensity(1.0));
    let mut backend = RecordingBackend::new();
    for _ in 0..10 {
        feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);
    }
    assert_eq!(backend.allocation_count(), 3);
    assert_eq!(backend.live_textures(), 3);

    // Camera resize: one reallocation round
    feature.render_camera(CameraId(0), &camera_frame(1024, 768), &mut backend);
    assert_eq!(backend.allocation_count(), 6);
    assert_eq!(backend.live_textures(), 3);

    // Sample count and depth bits of the camera do not leak into the buffers
    let frame = CameraFrameContext::new(
        Mat4::perspective_rh(1.0, 4.0 / 3.0, 0.1, 500.0),
        Mat4::IDENTITY,
        CameraTargetDescriptor::new(1024, 768, BufferFormat::Rgba16Float),
    );
    feature.render_camera(CameraId(0), &frame, &mut backend);
    assert_eq!(backend.allocation_count(), 6);
}

#[test]
fn test_cameras_are_isolated() {
    let mut feature = feature_with(OcclusionSettings::new().with_intensity(1.0));
    let mut backend = RecordingBackend::new();

    feature.render_camera(CameraId(1), &camera_frame(800, 600), &mut backend);
    feature.render_camera(CameraId(2), &camera_frame(800, 600), &mut backend);
    assert_eq!(feature.camera_count(), 2);
    assert_eq!(backend.live_textures(), 6);

    let handles = |camera| {
        let pipeline = feature.pipeline(camera).unwrap();
        BufferSlot::ALL.map(|slot| *pipeline.targets().get(slot).unwrap())
    };
    let first = handles(CameraId(1));
    let second = handles(CameraId(2));
    assert!(first.iter().all(|h| !second.contains(h)));

    feature.remove_camera(CameraId(1), &mut backend).unwrap();
    assert_eq!(backend.live_textures(), 3);
    assert_eq!(feature.camera_state(CameraId(2)), Some(PipelineState::Active));
    assert!(matches!(
        feature.remove_camera(CameraId(1), &mut backend),
        Err(OcclusionError::UnknownCamera(1))
    ));

    feature.shutdown(&mut backend);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(feature.camera_count(), 0);
}

#[test]
fn test_going_inactive_releases_buffers() {
    let settings = SharedSettings::new(OcclusionSettings::new().with_intensity(1.0));
    let mut feature = OcclusionFeature::new(settings.clone());
    let mut backend = RecordingBackend::new();

    feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);
    assert_eq!(backend.live_textures(), 3);

    settings.update(|s| s.intensity = 0.0);
    backend.clear();
    let enqueued = feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);
    assert_eq!(enqueued, EnqueuedPasses::NONE);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.blit_count(), 0);
    assert_eq!(feature.camera_state(CameraId(0)), Some(PipelineState::Inactive));

    settings.update(|s| s.intensity = 0.5);
    feature.render_camera(CameraId(0), &camera_frame(800, 600), &mut backend);
    assert_eq!(backend.live_textures(), 3);
    assert_eq!(feature.camera_state(CameraId(0)), Some(PipelineState::Active));
}

#[test]
fn test_settings_change_switches_permutation() {
    let settings = SharedSettings::new(OcclusionSettings::new().with_intensity(1.0));
    let mut feature = OcclusionFeature::new(settings.clone());
    let mut backend = RecordingBackend::new();

    feature.render_camera(CameraId(0), &camera_frame(400, 300), &mut backend);
    settings.update(|s| s.algorithm = Algorithm::ScalableObscurance);
    feature.render_camera(CameraId(0), &camera_frame(400, 300), &mut backend);

    let permutations: Vec<_> = backend
        .blits()
        .filter_map(|b| match b.program {
            RecordedProgram::Occlusion {
                pass: ShaderPass::Estimate,
                permutation,
                params,
            } => Some((permutation, params.camera_projection.is_some())),
            _ => None,
        })
        .collect();
    assert_eq!(permutations.len(), 2);
    assert_ne!(permutations[0].0, permutations[1].0);
    assert!(!permutations[0].1);
    assert!(permutations[1].1);
}

proptest! {
    #[test]
    fn prop_buffers_track_resolution(
        width in 1u32..4096,
        height in 1u32..4096,
        half in any::<bool>(),
    ) {
        let resolution = if half { Resolution::Half } else { Resolution::Full };
        let settings = OcclusionSettings::new().with_intensity(1.0).with_resolution(resolution);
        let mut feature = feature_with(settings);
        let mut backend = RecordingBackend::new();
        feature.render_camera(CameraId(0), &camera_frame(width, height), &mut backend);

        let desc = *feature
            .pipeline(CameraId(0))
            .unwrap()
            .targets()
            .descriptor(BufferSlot::Final)
            .unwrap();
        if half {
            prop_assert_eq!((desc.width, desc.height), (width >> 1, height >> 1));
        } else {
            prop_assert_eq!((desc.width, desc.height), (width, height));
        }
        prop_assert_eq!(backend.live_textures(), 3);
    }
}

//! Renders one offscreen frame with occlusion and prints what ran.
//!
//! Usage: `cargo run --example headless_frame [settings.json]`
//!
//! Without an argument, GTAO at half resolution is used. Set `RUST_LOG=debug`
//! to see buffer allocation and permutation changes.

use occlusion::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let settings = match std::env::args().nth(1) {
        Some(path) => load_settings(path)?,
        None => OcclusionSettings::new()
            .with_intensity(1.5)
            .with_resolution(Resolution::Half)
            .with_quality(Quality::High),
    };
    log::info!("settings: {settings:?}");

    // Dry run against the recording backend to show the pass list
    let mut feature = OcclusionFeature::new(SharedSettings::new(settings));
    let mut recorder = RecordingBackend::new();
    let frame = HeadlessFrame::new(640, 360);
    let camera = CameraFrameContext::new(
        frame.projection,
        frame.world_to_camera,
        CameraTargetDescriptor::new(frame.width, frame.height, BufferFormat::Rgba8Unorm),
    );
    feature.render_camera(CameraId(0), &camera, &mut recorder);
    for blit in recorder.blits() {
        println!("  {:<20} {:?} -> {:?}", blit.label, blit.source, blit.target);
    }
    feature.shutdown(&mut recorder);

    let output = render_headless(settings, &frame)?;
    match output.occlusion {
        Some(pixels) => {
            let mean = pixels.chunks(4).map(|px| f64::from(px[0])).sum::<f64>()
                / (pixels.len() / 4) as f64;
            println!(
                "rendered {}x{}, mean visibility {:.3}",
                frame.width,
                frame.height,
                mean / 255.0
            );
        }
        None => println!("occlusion inactive (intensity is zero)"),
    }

    Ok(())
}

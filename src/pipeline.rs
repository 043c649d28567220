//! End-to-end frame production: evaluate, compile, rasterize, encode.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::{
    assets::PreparedAssetStore,
    compile::compile_frame,
    core::FrameIndex,
    encode_ffmpeg::Mp4Encoder,
    error::{VignetteError, VignetteResult},
    eval::Evaluator,
    render::{FrameRGBA, RenderBackend, RenderSettings},
    render_cpu::CpuBackend,
    scene::Scene,
    timeline::{Timeline, compile_timeline},
};

pub fn render_frame(
    timeline: &Timeline,
    frame: FrameIndex,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> VignetteResult<FrameRGBA> {
    let eval = Evaluator::eval_frame(timeline, frame)?;
    let plan = compile_frame(timeline, &eval, assets)?;
    backend.render_plan(&plan, assets)
}

/// Renders a contiguous range of frames in order.
pub fn render_frames(
    timeline: &Timeline,
    range: crate::core::FrameRange,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> VignetteResult<Vec<FrameRGBA>> {
    let mut out = Vec::with_capacity(range.len_frames() as usize);
    for i in range.start.0..range.end.0 {
        out.push(render_frame(timeline, FrameIndex(i), backend, assets)?);
    }
    Ok(out)
}

/// Compiles a scene and renders a single frame of it on the CPU backend.
pub fn render_scene_frame(
    scene: &Scene,
    frame: FrameIndex,
    assets_root: &Path,
) -> VignetteResult<FrameRGBA> {
    let timeline = compile_timeline(scene)?;
    let assets = PreparedAssetStore::prepare(&timeline, assets_root)?;
    let mut backend = CpuBackend::new(RenderSettings::default());
    render_frame(&timeline, frame, &mut backend, &assets)
}

#[derive(Clone, Debug)]
pub struct RenderStats {
    pub frames: u64,
    pub elapsed: Duration,
}

impl RenderStats {
    pub fn fps_achieved(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.frames as f64 / secs
    }
}

#[tracing::instrument(skip(scene), fields(scene = %scene.name, out = %out_path.display()))]
pub fn render_to_mp4(
    scene: &Scene,
    out_path: PathBuf,
    assets_root: &Path,
) -> VignetteResult<RenderStats> {
    let timeline = compile_timeline(scene)?;
    let assets = PreparedAssetStore::prepare(&timeline, assets_root)?;

    // The rawvideo pipe carries an integer frame rate.
    if timeline.fps.den != 1 {
        return Err(VignetteError::validation(
            "mp4 encoding requires an integer fps (den == 1)",
        ));
    }
    let mut encoder = Mp4Encoder::create(
        &out_path,
        timeline.canvas,
        timeline.fps.num,
        timeline.background,
    )?;
    let mut backend = CpuBackend::new(RenderSettings::default());

    let start = Instant::now();
    let total = timeline.duration.0;
    for i in 0..total {
        let frame = render_frame(&timeline, FrameIndex(i), &mut backend, &assets)?;
        encoder.push_frame(&frame)?;
        if i > 0 && i.is_multiple_of(30) {
            tracing::info!(frame = i, total, "encoding");
        }
    }
    encoder.finish()?;

    let stats = RenderStats {
        frames: total,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        frames = stats.frames,
        secs = stats.elapsed.as_secs_f64(),
        fps = stats.fps_achieved(),
        "render complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Canvas, Fps, Vec2},
        scene::{AnimationRequest, Color, Mobject, Placement, SceneBuilder},
    };

    fn shapes_scene() -> Scene {
        SceneBuilder::new(
            "p",
            Fps::new(30, 1).unwrap(),
            Canvas {
                width: 64,
                height: 64,
            },
        )
        .background(Color::BLACK)
        .mobject(
            "c",
            Mobject::Circle {
                radius: 1.0,
                color: Color::RED,
                fill_opacity: 0.8,
            },
            Placement::At(Vec2::ZERO),
        )
        .unwrap()
        .play(
            vec![AnimationRequest::FadeIn {
                target: "c".to_string(),
                scale_from: 0.5,
            }],
            1.0,
        )
        .build()
        .unwrap()
    }

    #[test]
    fn scene_frame_renders_a_full_rgba_buffer() {
        let frame = render_scene_frame(&shapes_scene(), FrameIndex(29), Path::new(".")).unwrap();
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 64);
        assert_eq!(frame.data.len(), 64 * 64 * 4);
    }

    #[test]
    fn rendered_shape_touches_pixels() {
        let frame = render_scene_frame(&shapes_scene(), FrameIndex(29), Path::new(".")).unwrap();
        // Background is opaque black; a faded-in red circle must leave
        // at least one pixel with a red channel above it.
        let any_red = frame.data.chunks_exact(4).any(|px| px[0] > 0);
        assert!(any_red);
    }

    #[test]
    fn render_frames_covers_the_whole_range() {
        let timeline = compile_timeline(&shapes_scene()).unwrap();
        let assets = PreparedAssetStore::prepare(&timeline, Path::new(".")).unwrap();
        let mut backend = CpuBackend::new(RenderSettings::default());
        let range = crate::core::FrameRange::new(FrameIndex(0), FrameIndex(3)).unwrap();
        let frames = render_frames(&timeline, range, &mut backend, &assets).unwrap();
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn fractional_fps_is_rejected_for_mp4() {
        let mut scene = shapes_scene();
        scene.fps = Fps::new(30000, 1001).unwrap();
        let err = render_to_mp4(
            &scene,
            PathBuf::from("out/never-written.mp4"),
            Path::new("."),
        );
        assert!(err.is_err());
    }
}

use std::path::{Path, PathBuf};

use vignette::{
    AnimationRequest, Canvas, Color, Fps, Mobject, Placement, SceneBuilder, Vec2,
    is_ffmpeg_on_path, render_to_mp4,
};

#[test]
fn mp4_encode_produces_a_nonempty_file() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }

    let scene = SceneBuilder::new(
        "encode_smoke",
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
    .unwrap();

    let out = PathBuf::from("target")
        .join("encode_smoke")
        .join("scene.mp4");
    let _ = std::fs::remove_file(&out);

    let stats = render_to_mp4(&scene, out.clone(), Path::new(".")).unwrap();
    assert_eq!(stats.frames, 30);
    assert!(out.exists());
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

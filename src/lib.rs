#![forbid(unsafe_code)]

pub mod anim;
pub mod anim_ease;
pub mod assets;
pub mod compile;
pub mod core;
pub mod encode_ffmpeg;
pub mod error;
pub mod eval;
pub mod pipeline;
pub mod render;
pub mod render_cpu;
pub mod scene;
pub mod timeline;
pub mod vignette;

pub use anim::Anim;
pub use anim_ease::Ease;
pub use assets::{AssetId, PreparedAssetStore};
pub use compile::{DrawOp, PaintColor, RenderPlan, compile_frame};
pub use core::{Canvas, Fps, FrameIndex, FrameRange, Transform2D, Vec2};
pub use encode_ffmpeg::{Mp4Encoder, is_ffmpeg_on_path};
pub use error::{VignetteError, VignetteResult};
pub use eval::{EvaluatedGraph, Evaluator};
pub use pipeline::{
    RenderStats, render_frame, render_frames, render_scene_frame, render_to_mp4,
};
pub use render::{FrameRGBA, RenderBackend, RenderSettings};
pub use render_cpu::CpuBackend;
pub use scene::{
    AnimationRequest, Color, Mobject, MobjectDecl, Placement, Scene, SceneBuilder, Step,
};
pub use timeline::{Actor, Timeline, compile_timeline};
pub use vignette::{DEFAULT_CANVAS, circle_and_square};

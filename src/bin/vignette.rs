use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use vignette::{Canvas, Fps, FrameIndex, circle_and_square};

#[derive(Parser, Debug)]
#[command(name = "vignette", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the animation steps of the scene as JSON.
    Steps(SceneArgs),
    /// Print the full scene description as JSON.
    Dump(SceneArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the scene as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Font file for the title (defaults to probing system fonts).
    #[arg(long)]
    font: Option<PathBuf>,
}

impl SceneArgs {
    fn build_scene(&self) -> anyhow::Result<vignette::Scene> {
        let fps = Fps::new(self.fps, 1)?;
        let canvas = Canvas {
            width: self.width,
            height: self.height,
        };
        let font_source = self
            .font
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        Ok(circle_and_square(fps, canvas, font_source)?)
    }
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Steps(args) => cmd_steps(args),
        Command::Dump(args) => cmd_dump(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_steps(args: SceneArgs) -> anyhow::Result<()> {
    let scene = args.build_scene()?;
    let json = serde_json::to_string_pretty(&scene.steps).context("serialize steps")?;
    println!("{json}");
    Ok(())
}

fn cmd_dump(args: SceneArgs) -> anyhow::Result<()> {
    let scene = args.build_scene()?;
    println!("{}", scene.to_json_pretty()?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = args.scene.build_scene()?;
    let frame = vignette::render_scene_frame(&scene, FrameIndex(args.frame), Path::new("."))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene = args.scene.build_scene()?;
    let stats = vignette::render_to_mp4(&scene, args.out.clone(), Path::new("."))?;
    eprintln!(
        "wrote {} ({} frames in {:.2}s)",
        args.out.display(),
        stats.frames,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

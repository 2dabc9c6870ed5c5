use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "animator", version)]
struct Cli {
    /// Log debug events to stderr (overrides RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode the frames listed in a JSON manifest.
    Render(RenderArgs),
    /// Encode a list of image files with a shared duration.
    Images(ImagesArgs),
    /// Print the canvas size a manifest resolves to.
    Canvas(CanvasArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file (.gif, .png/.apng, .mp4/.mov/.m4v).
    #[arg(long)]
    out: PathBuf,

    /// Composite frames in parallel.
    #[arg(long)]
    parallel: bool,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,
}

#[derive(Parser, Debug)]
struct ImagesArgs {
    /// Output file (.gif, .png/.apng, .mp4/.mov/.m4v).
    #[arg(long)]
    out: PathBuf,

    /// Display duration of every frame, in seconds.
    #[arg(long, default_value_t = 1.0)]
    duration: f64,

    /// Fill color around smaller frames (#RRGGBB or #RRGGBBAA).
    #[arg(long, default_value = "#000000")]
    background: animator::Rgba8,

    /// Canvas width; requires --height.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Canvas height; requires --width.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Loop count (0 loops forever).
    #[arg(long, default_value_t = 0)]
    loop_count: u16,

    /// Frame rate for video output.
    #[arg(long, default_value_t = animator::encode::ffmpeg::DEFAULT_VIDEO_FPS)]
    fps: u32,

    /// Composite frames in parallel.
    #[arg(long)]
    parallel: bool,

    /// Input images, in display order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct CanvasArgs {
    /// Input manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Images(args) => cmd_images(args),
        Command::Canvas(args) => cmd_canvas(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_manifest(path: &Path) -> anyhow::Result<animator::AnimationManifest> {
    let manifest = animator::AnimationManifest::load(path)?;
    manifest
        .validate()
        .with_context(|| format!("validate manifest '{}'", path.display()))?;
    Ok(manifest)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let frames = manifest.load_frames(root)?;

    let opts = animator::AnimateOpts {
        parallel: args.parallel,
        overwrite: !args.no_overwrite,
        ..manifest.animate_opts()
    };
    let stats = animator::write_animation(&frames, &args.out, &opts)
        .with_context(|| format!("write animation '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {}, {:.2}s)",
        args.out.display(),
        stats.frames,
        stats.canvas,
        stats.total_duration
    );
    Ok(())
}

fn cmd_images(args: ImagesArgs) -> anyhow::Result<()> {
    let images = args
        .images
        .iter()
        .map(|p| animator::load_image(p))
        .collect::<Result<Vec<_>, _>>()?;
    let frames = animator::frames_from_images(images, args.duration, args.background)?;

    let opts = animator::AnimateOpts {
        canvas: args
            .width
            .zip(args.height)
            .map(|(w, h)| animator::Size::new(w, h)),
        loop_count: args.loop_count,
        fps: args.fps,
        video_background: args.background,
        parallel: args.parallel,
        ..Default::default()
    };
    let stats = animator::write_animation(&frames, &args.out, &opts)
        .with_context(|| format!("write animation '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {})",
        args.out.display(),
        stats.frames,
        stats.canvas
    );
    Ok(())
}

fn cmd_canvas(args: CanvasArgs) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.in_path)?;
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let frames = manifest.load_frames(root)?;
    let canvas = animator::infer_canvas_size(&frames, manifest.canvas)?;
    println!("{canvas}");
    Ok(())
}

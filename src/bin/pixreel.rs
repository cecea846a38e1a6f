use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "pixreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a range of frames as numbered PNGs.
    Export(ExportArgs),
    /// Print a summary of the timeline.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project bundle JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project bundle JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory; frames are written as `frame_NNNN.png`.
    #[arg(long)]
    out_dir: PathBuf,

    /// First frame (inclusive). Defaults to 0.
    #[arg(long)]
    start: Option<u32>,

    /// Last frame (exclusive). Defaults to the frame count.
    #[arg(long)]
    end: Option<u32>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input project bundle JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Decode audio tracks and report their length.
    #[arg(long)]
    decode_audio: bool,
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn bundle_root(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn open_project(
    path: &Path,
) -> anyhow::Result<(pixreel::RasterDocument, pixreel::CanvasAnimationState)> {
    let bundle = pixreel::ProjectBundle::load(path)
        .with_context(|| format!("open project '{}'", path.display()))?;
    let (doc, mut state) = bundle.open()?;

    let resolver = pixreel::FsReelResolver::new(bundle_root(path));
    for warning in state.load_sub_routines(&resolver) {
        eprintln!("warning: {warning}");
    }
    Ok((doc, state))
}

fn write_png(surface: &pixreel::Surface, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let bytes = pixreel::encode_png(surface)?;
    std::fs::write(out, bytes).with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (doc, state) = open_project(&args.in_path)?;
    let frame = pixreel::FrameCompositor::new(&state, &doc).render_frame(args.frame)?;
    write_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let (doc, state) = open_project(&args.in_path)?;
    let range = pixreel::FrameRange::new(
        args.start.unwrap_or(0),
        args.end.unwrap_or(state.frame_count()),
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut written = 0usize;
    pixreel::FrameCompositor::new(&state, &doc).render_range(range, |frame, surface| {
        let out = args.out_dir.join(format!("frame_{frame:04}.png"));
        write_png(&surface, &out)?;
        written += 1;
        Ok(())
    })?;

    eprintln!("wrote {written} frames to {}", args.out_dir.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let (doc, mut state) = open_project(&args.in_path)?;

    let canvas = pixreel::FrameCompositor::new(&state, &doc).output_canvas();
    println!("frames:        {} @ {} fps", state.frame_count(), state.fps());
    println!("output:        {}x{}", canvas.width, canvas.height);
    println!(
        "stage:         {}",
        if state.stage().enabled { "on" } else { "off" }
    );
    println!("layers:        {}", state.layer_tracks().len());
    println!("sub-routines:  {}", state.sub_routines().len());

    println!("stacking (top first):");
    for entry in state.stacking_order(&doc) {
        match entry.item {
            pixreel::ZItem::Layer { id, .. } => {
                let name = doc.layer(id).map(|l| l.name.as_str()).unwrap_or("?");
                println!("  z={:<4} layer        {name}", entry.z);
            }
            pixreel::ZItem::SubRoutine(id) => {
                let Some(sub) = state.sub_routines().get(id) else {
                    continue;
                };
                let range = sub.frame_range();
                println!(
                    "  z={:<4} sub-routine  {} [{}, {}){}",
                    entry.z,
                    sub.name,
                    range.start,
                    range.end,
                    if sub.is_loaded() { "" } else { " (unloaded)" }
                );
            }
        }
    }

    if args.decode_audio && state.audio_tracks().count() > 0 {
        state.start_audio_decode(bundle_root(&args.in_path))?;
        while state.audio_tracks().is_decoding() {
            for event in state.wait_audio(std::time::Duration::from_millis(200)) {
                if let pixreel::WaveformEvent::Failed(id, error) = event {
                    eprintln!("warning: audio track {} failed to decode: {error}", id.0);
                }
            }
        }
    }

    println!("audio tracks:  {}", state.audio_tracks().count());
    let fps = state.fps();
    let frame_count = state.frame_count();
    for track in state.audio_tracks().iter() {
        let (start, end) = track.frame_span(fps);
        let visible = track
            .display_frames(fps, frame_count)
            .map(|r| format!("[{}, {})", r.start, r.end))
            .unwrap_or_else(|| "hidden".to_string());
        println!(
            "  {:<20} frames [{start}, {end}) visible {visible}{}",
            track.settings.display_name,
            if track.settings.muted { " muted" } else { "" }
        );
    }
    Ok(())
}

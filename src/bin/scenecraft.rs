use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scenecraft", version)]
struct Cli {
    /// Optional editor config JSON (fps, pixels per second, ...).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a project JSON file.
    Validate(InArgs),
    /// Print scenes with their timeline placement.
    Inspect(InspectArgs),
    /// Map a horizontal timeline pixel to a frame and scene.
    Locate(LocateArgs),
}

#[derive(Parser, Debug)]
struct InArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Container width in pixels used to lay out scene blocks.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,
}

#[derive(Parser, Debug)]
struct LocateArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Horizontal offset in pixels at the reference pixels-per-second scale.
    #[arg(long)]
    x: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => scenecraft::EditorConfig::from_json_file(path)?,
        None => scenecraft::EditorConfig::default(),
    };
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Inspect(args) => cmd_inspect(args, config),
        Command::Locate(args) => cmd_locate(args, config),
    }
}

fn open_editor(
    path: &Path,
    config: scenecraft::EditorConfig,
) -> anyhow::Result<scenecraft::EditorContext> {
    let doc = scenecraft::read_project_json(path)
        .with_context(|| format!("read project '{}'", path.display()))?;
    let mut editor = scenecraft::EditorContext::create(config)?;
    editor
        .load_project(doc)
        .with_context(|| format!("load project '{}'", path.display()))?;
    Ok(editor)
}

fn cmd_validate(args: InArgs) -> anyhow::Result<()> {
    let doc = scenecraft::read_project_json(&args.in_path)?;
    doc.validate()
        .with_context(|| format!("validate '{}'", args.in_path.display()))?;
    eprintln!(
        "ok: {} scene(s), {} component(s)",
        doc.scenes.len(),
        doc.scenes.iter().map(|s| s.components.len()).sum::<usize>()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs, config: scenecraft::EditorConfig) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.in_path, config)?;
    editor.resize_container(args.width);

    let fps = editor.config().fps;
    let playback = editor.playback();
    let total = playback.duration_in_frames();
    if let Some(project) = editor.project() {
        println!("project {} ({})", project.id, project.name);
    }
    println!(
        "total {total} frames ({:.2}s), {:.3} px/frame",
        fps.frames_to_secs(total),
        playback.pixels_per_frame()
    );

    for block in editor.scenes().scene_blocks(playback.pixels_per_frame()) {
        let scene = editor
            .scenes()
            .scene(&block.scene_id)
            .with_context(|| format!("scene '{}' vanished (bug)", block.scene_id))?;
        println!(
            "  {:<12} start={:<6} frames={:<6} x={:<8.1} w={:<8.1} components={} \"{}\"",
            scene.id,
            block.start.0,
            scene.duration_in_frames,
            block.x,
            block.width,
            scene.components.len(),
            scene.title
        );
        for c in &scene.components {
            println!(
                "    {:<10} {:<5} [{}, {}) at ({:.0},{:.0}) {:.0}x{:.0}",
                c.id,
                c.kind.name(),
                c.from,
                c.to,
                c.left,
                c.top,
                c.width,
                c.height
            );
        }
    }
    Ok(())
}

fn cmd_locate(args: LocateArgs, config: scenecraft::EditorConfig) -> anyhow::Result<()> {
    let editor = open_editor(&args.in_path, config)?;
    let frame = editor.timeline_frame_at_x(args.x);
    match editor.scenes().scene_at_frame(frame) {
        Some((scene, local)) => println!(
            "x={} -> frame {} -> scene {} local frame {}",
            args.x, frame.0, scene.id, local.0
        ),
        None => println!("x={} -> frame {} (no scenes)", args.x, frame.0),
    }
    Ok(())
}

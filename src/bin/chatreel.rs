use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chatreel::{HttpClient, RenderConfig, ReqwestClient, Rgba8};

#[derive(Parser, Debug)]
#[command(name = "chatreel", version, about = "Render chat-replay logs into MP4 clips")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the chat log to an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render the chat as it looks at one instant to a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Chat-replay log (one JSON record per line).
    input: PathBuf,

    /// Output MP4 path. Defaults to `<input stem>.mp4` next to the input.
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Window start in seconds.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Window end in seconds. Defaults to the last message.
    #[arg(long)]
    to: Option<f64>,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Chat-replay log (one JSON record per line).
    input: PathBuf,

    /// Stream time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long, short)]
    out: PathBuf,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Args, Debug)]
struct StyleArgs {
    #[arg(long, default_value_t = 400)]
    width: u32,

    #[arg(long, default_value_t = 540)]
    height: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// TrueType/OpenType font for message text.
    #[arg(long)]
    font: PathBuf,

    /// Font for author names. Defaults to `--font`.
    #[arg(long)]
    author_font: Option<PathBuf>,

    #[arg(long, default_value_t = 18.0)]
    font_size: f32,

    /// Background color as #rrggbb or #rrggbbaa.
    #[arg(long, default_value = "#18181b")]
    background: Rgba8,

    #[arg(long, default_value = "#ffc83d")]
    author_color: Rgba8,

    #[arg(long, default_value = "#efeff1")]
    message_color: Rgba8,

    /// Do not download author avatars.
    #[arg(long)]
    skip_avatars: bool,

    /// YouTube Data API key for avatar lookups.
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl StyleArgs {
    fn into_config(self, from_s: f64, to_s: Option<f64>) -> RenderConfig {
        RenderConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            from_s,
            to_s,
            background: self.background,
            author_color: self.author_color,
            message_color: self.message_color,
            font_path: self.font,
            author_font_path: self.author_font,
            font_size: self.font_size,
            skip_avatars: self.skip_avatars,
            api_key: self.api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| chatreel::default_out_path(&args.input));
    let cfg = args.style.into_config(args.from, args.to);
    let http = ReqwestClient::new()?;

    let summary = chatreel::render_chat_to_mp4(&args.input, &out, &cfg, &http)
        .with_context(|| format!("render '{}'", args.input.display()))?;

    tracing::info!(
        messages = summary.messages,
        frames = summary.frames,
        redraws = summary.redraws,
        downloads = summary.downloads,
        "render complete"
    );
    eprintln!("wrote {}", summary.out_path.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = args.style.into_config(0.0, None);
    cfg.validate()?;
    let http: &dyn HttpClient = &ReqwestClient::new()?;

    let timeline = chatreel::load_timeline(&args.input, &cfg, http)?;
    let frame = chatreel::render_snapshot(&timeline.messages, &cfg, args.at)?;

    chatreel::ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

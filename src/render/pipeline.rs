use std::path::{Path, PathBuf};

use crate::{
    assets::{cache::ImageCache, fetch::HttpClient},
    chat::{
        model::ChatMessage,
        normalize::{NormalizeStats, Normalizer, read_chat_log},
    },
    config::RenderConfig,
    encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts},
    foundation::error::{ChatreelError, ChatreelResult},
    render::{
        chat::{ChatRenderer, FramePainter},
        frame::FrameRGBA,
        pump::FramePump,
    },
    timeline::playhead::find_start_index,
};

/// Normalized messages plus what it took to get them.
#[derive(Clone, Debug)]
pub struct Timeline {
    pub messages: Vec<ChatMessage>,
    pub stats: NormalizeStats,
    pub downloads: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    pub out_path: PathBuf,
    pub messages: usize,
    pub frames: u64,
    pub redraws: u64,
    pub downloads: u64,
    pub from_s: f64,
    pub to_s: f64,
}

/// `<stem>.mp4` next to the chat log.
pub fn default_out_path(log_path: &Path) -> PathBuf {
    log_path.with_extension("mp4")
}

/// Read and normalize a chat log. An empty timeline is an input error.
#[tracing::instrument(skip_all, fields(log = %log_path.display()))]
pub fn load_timeline(
    log_path: &Path,
    cfg: &RenderConfig,
    http: &dyn HttpClient,
) -> ChatreelResult<Timeline> {
    if !log_path.is_file() {
        return Err(ChatreelError::input(format!(
            "chat log '{}' does not exist",
            log_path.display()
        )));
    }
    let lines = read_chat_log(log_path)?;

    let mut cache = ImageCache::new();
    let mut normalizer = Normalizer::new(http, &mut cache, cfg.normalize_options());
    let messages = normalizer.normalize(&lines);
    let stats = normalizer.stats().clone();

    if messages.is_empty() {
        return Err(ChatreelError::input(format!(
            "no chat messages found in '{}' ({} records read)",
            log_path.display(),
            stats.records
        )));
    }

    Ok(Timeline {
        messages,
        stats,
        downloads: cache.downloads(),
    })
}

/// Full run: chat log in, MP4 out.
///
/// The time window is checked before fonts are loaded or `ffmpeg` is spawned.
pub fn render_chat_to_mp4(
    log_path: &Path,
    out_path: &Path,
    cfg: &RenderConfig,
    http: &dyn HttpClient,
) -> ChatreelResult<RenderSummary> {
    cfg.validate()?;
    let timeline = load_timeline(log_path, cfg, http)?;
    let timing = cfg.frame_timing(&timeline.messages)?;
    tracing::info!(
        messages = timeline.messages.len(),
        from_s = timing.from_s,
        to_s = timing.to_s,
        frames = timing.total_frames(),
        "starting render"
    );

    let mut renderer = ChatRenderer::from_config(cfg)?;
    let mut sink =
        FfmpegSink::new(FfmpegSinkOpts::new(out_path).with_background(cfg.background));
    let stats = FramePump::new(timing).run(&timeline.messages, &mut renderer, &mut sink)?;

    Ok(RenderSummary {
        out_path: out_path.to_path_buf(),
        messages: timeline.messages.len(),
        frames: stats.frames,
        redraws: stats.redraws,
        downloads: timeline.downloads,
        from_s: timing.from_s,
        to_s: timing.to_s,
    })
}

/// The chat as it looks at `at_s`.
pub fn render_snapshot(
    messages: &[ChatMessage],
    cfg: &RenderConfig,
    at_s: f64,
) -> ChatreelResult<FrameRGBA> {
    cfg.validate()?;
    if !at_s.is_finite() {
        return Err(ChatreelError::validation("snapshot time must be finite"));
    }
    let mut renderer = ChatRenderer::from_config(cfg)?;
    renderer.paint(messages, find_start_index(messages, at_s))?;
    Ok(renderer.frame().clone())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;

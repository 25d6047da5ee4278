//! chatreel renders captured chat-replay logs into video clips of the chat scrolling in sync
//! with stream time.
//!
//! The pipeline:
//!
//! - Normalize newline-delimited JSON records into an ordered [`ChatMessage`] timeline,
//!   resolving avatars and emoji through a per-run [`ImageCache`]
//! - Advance a [`Playhead`] frame by frame over the window
//! - Repaint the bottom-anchored chat with [`ChatRenderer`] when messages are revealed
//! - Stream every frame to a [`FrameSink`], normally [`FfmpegSink`] producing an H.264 MP4
#![forbid(unsafe_code)]

pub mod assets;
pub mod chat;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod timeline;


pub use crate::assets::cache::{CacheEntry, ImageCache, NegativeCachePolicy};
pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::fetch::{HttpClient, ReqwestClient};
pub use crate::chat::model::{ChatMessage, EmojiSpan, Span};
pub use crate::chat::normalize::{NormalizeOptions, NormalizeStats, Normalizer};
pub use crate::chat::record::{SkipReason, decode_record};
pub use crate::config::RenderConfig;
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::foundation::core::{Canvas, Rgba8};
pub use crate::foundation::error::{ChatreelError, ChatreelResult};
pub use crate::layout::text::TextLayoutEngine;
pub use crate::layout::wrap::{LayoutLine, PlacedItem, PlacedSpan, TextMeasure, WrapParams, wrap};
pub use crate::render::chat::{ChatRenderer, ChatStyle, FramePainter};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::pipeline::{
    RenderSummary, Timeline, default_out_path, load_timeline, render_chat_to_mp4,
    render_snapshot,
};
pub use crate::render::pump::{FramePump, FrameTiming, PADDING_SECONDS, PumpStats};
pub use crate::timeline::playhead::{Playhead, find_start_index};

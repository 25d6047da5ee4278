use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    chat::{model::ChatMessage, normalize::NormalizeOptions},
    foundation::{
        core::{Canvas, Rgba8},
        error::{ChatreelError, ChatreelResult},
    },
    render::pump::FrameTiming,
};

/// Everything a render needs, fixed for the whole run.
///
/// Colors and fonts flow from here into the renderer at construction; nothing reads them from
/// ambient state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Window start in seconds of stream time.
    pub from_s: f64,
    /// Window end; the last message timestamp when absent.
    pub to_s: Option<f64>,
    pub background: Rgba8,
    pub author_color: Rgba8,
    pub message_color: Rgba8,
    /// Font for message text (and author labels unless `author_font_path` is set).
    pub font_path: PathBuf,
    pub author_font_path: Option<PathBuf>,
    pub font_size: f32,
    pub skip_avatars: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 540,
            fps: 30,
            from_s: 0.0,
            to_s: None,
            background: Rgba8::rgb(0x18, 0x18, 0x1b),
            author_color: Rgba8::rgb(0xff, 0xc8, 0x3d),
            message_color: Rgba8::rgb(0xef, 0xef, 0xf1),
            font_path: PathBuf::new(),
            author_font_path: None,
            font_size: 18.0,
            skip_avatars: false,
            api_key: None,
        }
    }
}

impl RenderConfig {
    /// Check values that do not depend on the message timeline.
    pub fn validate(&self) -> ChatreelResult<()> {
        Canvas::new(self.width, self.height)?;
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ChatreelError::validation(format!(
                "canvas {}x{} must have even dimensions for yuv420p output",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > 240 {
            return Err(ChatreelError::validation(format!(
                "fps must be in 1..=240, got {}",
                self.fps
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ChatreelError::validation(
                "font size must be finite and > 0",
            ));
        }
        if self.font_path.as_os_str().is_empty() {
            return Err(ChatreelError::validation("a font file is required"));
        }
        if !self.from_s.is_finite() || self.from_s < 0.0 {
            return Err(ChatreelError::validation(format!(
                "window start must be a finite non-negative time, got {}",
                self.from_s
            )));
        }
        if let Some(to) = self.to_s
            && !to.is_finite()
        {
            return Err(ChatreelError::validation("window end must be finite"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> ChatreelResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            resolve_avatars: !self.skip_avatars,
            api_key: self.api_key.clone(),
        }
    }

    /// Window end: explicit `to_s`, else the last message timestamp, never before `from_s`.
    pub fn resolved_to_s(&self, messages: &[ChatMessage]) -> f64 {
        match self.to_s {
            Some(to) => to,
            None => messages
                .last()
                .map_or(self.from_s, |m| m.timestamp_s.max(self.from_s)),
        }
    }

    /// Only an explicit `to_s` at or before `from_s` is rejected; an inferred end that lands
    /// on the start still renders the padding tail.
    pub fn frame_timing(&self, messages: &[ChatMessage]) -> ChatreelResult<FrameTiming> {
        let to_s = self.resolved_to_s(messages);
        match self.to_s {
            Some(_) => FrameTiming::new(self.fps, self.from_s, to_s),
            None => FrameTiming::derived(self.fps, self.from_s, to_s),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

use std::sync::Arc;

use crate::assets::decode::PreparedImage;

#[derive(Clone, Debug)]
/// One chat line as it will be drawn.
pub struct ChatMessage {
    /// Author display name (never empty).
    pub author: String,
    /// Author channel identifier, used as the avatar cache key.
    pub channel_id: Option<String>,
    /// Decoded avatar shared with the image cache.
    pub avatar: Option<Arc<PreparedImage>>,
    /// Message body in original order.
    pub content: Vec<Span>,
    /// Offset from stream start in seconds.
    pub timestamp_s: f64,
}

impl ChatMessage {
    /// Flatten the content to text, substituting emoji labels.
    ///
    /// Used for logs and text-only fallbacks; never for layout.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for span in &self.content {
            match span {
                Span::Text { text } => out.push_str(text),
                Span::Emoji(e) => {
                    if let Some(label) = &e.fallback_label {
                        out.push_str(label);
                    }
                }
            }
        }
        out
    }

    pub fn emoji_spans(&self) -> impl Iterator<Item = &EmojiSpan> {
        self.content.iter().filter_map(|s| match s {
            Span::Emoji(e) => Some(e),
            Span::Text { .. } => None,
        })
    }
}

#[derive(Clone, Debug)]
/// Atomic piece of message content.
pub enum Span {
    Text { text: String },
    Emoji(EmojiSpan),
}

impl Span {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[derive(Clone, Debug)]
/// Inline emoji glyph.
///
/// With neither `image` nor `fallback_label` the emoji draws nothing and takes no space.
pub struct EmojiSpan {
    pub id: String,
    pub image_url: Option<String>,
    pub image: Option<Arc<PreparedImage>>,
    pub fallback_label: Option<String>,
}

impl EmojiSpan {
    pub fn cache_key(&self) -> String {
        format!("emoji:{}", self.id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/chat/model.rs"]
mod tests;

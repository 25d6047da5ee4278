//! Typed decoding of one chat-replay log line.
//!
//! A line either becomes a [`MessageCandidate`] or a [`SkipReason`]. Skips are expected: replay
//! logs interleave many event kinds besides text messages.

use serde::Deserialize;

use crate::chat::model::{EmojiSpan, Span};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Not a JSON object of the expected shape.
    Malformed,
    /// No `addChatItemAction` in the record.
    NotChatItem,
    /// The added item is not a plain text message (paid message, membership, banner, ...).
    NotTextMessage,
    /// No author display name, or a blank one.
    MissingAuthor,
    /// No usable millisecond offset.
    MissingOffset,
}

impl SkipReason {
    pub const ALL: [SkipReason; 5] = [
        SkipReason::Malformed,
        SkipReason::NotChatItem,
        SkipReason::NotTextMessage,
        SkipReason::MissingAuthor,
        SkipReason::MissingOffset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Malformed => "malformed",
            SkipReason::NotChatItem => "not_chat_item",
            SkipReason::NotTextMessage => "not_text_message",
            SkipReason::MissingAuthor => "missing_author",
            SkipReason::MissingOffset => "missing_offset",
        }
    }
}

#[derive(Clone, Debug)]
/// A fully typed text message before image resolution.
pub struct MessageCandidate {
    pub author: String,
    pub channel_id: Option<String>,
    pub avatar_urls: Vec<String>,
    pub content: Vec<Span>,
    pub timestamp_s: f64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    replay_chat_item_action: Option<RawReplayAction>,
    video_offset_time_msec: Option<serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawReplayAction {
    #[serde(default)]
    actions: Vec<RawAction>,
    video_offset_time_msec: Option<serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    add_chat_item_action: Option<RawAddChatItem>,
}

#[derive(Deserialize, Default)]
struct RawAddChatItem {
    item: Option<RawItem>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    live_chat_text_message_renderer: Option<RawTextMessage>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawTextMessage {
    author_name: Option<RawSimpleText>,
    message: Option<RawRuns>,
    author_photo: Option<RawThumbnails>,
    author_external_channel_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawSimpleText {
    simple_text: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawRuns {
    #[serde(default)]
    runs: Vec<RawRun>,
}

#[derive(Deserialize, Default)]
struct RawRun {
    text: Option<String>,
    emoji: Option<RawEmoji>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawEmoji {
    emoji_id: Option<String>,
    image: Option<RawEmojiImage>,
}

#[derive(Deserialize, Default)]
struct RawEmojiImage {
    #[serde(default)]
    thumbnails: Vec<RawThumbnail>,
    accessibility: Option<RawAccessibility>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawAccessibility {
    accessibility_data: Option<RawAccessibilityData>,
}

#[derive(Deserialize, Default)]
struct RawAccessibilityData {
    label: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawThumbnails {
    #[serde(default)]
    thumbnails: Vec<RawThumbnail>,
}

#[derive(Deserialize, Default)]
struct RawThumbnail {
    url: Option<String>,
}

/// Decode one log line.
pub fn decode_record(line: &str) -> Result<MessageCandidate, SkipReason> {
    let record: RawRecord = serde_json::from_str(line).map_err(|_| SkipReason::Malformed)?;
    let replay = record
        .replay_chat_item_action
        .ok_or(SkipReason::NotChatItem)?;

    let item = replay
        .actions
        .into_iter()
        .find_map(|a| a.add_chat_item_action)
        .ok_or(SkipReason::NotChatItem)?
        .item
        .ok_or(SkipReason::NotChatItem)?;
    let msg = item
        .live_chat_text_message_renderer
        .ok_or(SkipReason::NotTextMessage)?;

    let author = msg
        .author_name
        .and_then(|n| n.simple_text)
        .filter(|s| !s.trim().is_empty())
        .ok_or(SkipReason::MissingAuthor)?;

    let offset_ms = record
        .video_offset_time_msec
        .as_ref()
        .and_then(parse_offset_ms)
        .or_else(|| {
            replay
                .video_offset_time_msec
                .as_ref()
                .and_then(parse_offset_ms)
        })
        .ok_or(SkipReason::MissingOffset)?;

    let content = msg
        .message
        .map(|m| m.runs.into_iter().filter_map(run_to_span).collect())
        .unwrap_or_default();

    let avatar_urls = msg
        .author_photo
        .map(|p| p.thumbnails.into_iter().filter_map(|t| t.url).collect())
        .unwrap_or_default();

    Ok(MessageCandidate {
        author,
        channel_id: msg
            .author_external_channel_id
            .filter(|s| !s.trim().is_empty()),
        avatar_urls,
        content,
        timestamp_s: offset_ms / 1000.0,
    })
}

/// Offsets arrive as digit strings (`"1500"`) or plain numbers.
fn parse_offset_ms(v: &serde_json::Value) -> Option<f64> {
    let ms = match v {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    (ms.is_finite() && ms >= 0.0).then_some(ms)
}

fn run_to_span(run: RawRun) -> Option<Span> {
    if let Some(text) = run.text {
        return Some(Span::Text { text });
    }

    let emoji = run.emoji?;
    let (image_url, fallback_label) = match emoji.image {
        Some(img) => (
            img.thumbnails.into_iter().find_map(|t| t.url),
            img.accessibility
                .and_then(|a| a.accessibility_data)
                .and_then(|d| d.label)
                .filter(|l| !l.is_empty()),
        ),
        None => (None, None),
    };
    let id = emoji
        .emoji_id
        .or_else(|| image_url.clone())
        .or_else(|| fallback_label.clone())
        .unwrap_or_default();

    Some(Span::Emoji(EmojiSpan {
        id,
        image_url,
        image: None,
        fallback_label,
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/chat/record.rs"]
mod tests;

//! Greedy word wrapping of message spans.
//!
//! Lines are filled left to right from a start offset (the first line shares its row with the
//! avatar and author label) and continue at a fixed left margin. Words and emoji are never split:
//! a single token wider than the available width is placed alone and overflows.

use crate::chat::model::Span;

/// Width of a piece of text in pixels under the current font.
pub trait TextMeasure {
    fn text_width(&mut self, text: &str) -> f32;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WrapParams {
    /// Cursor position for the first line.
    pub start_x: f32,
    /// Cursor position for continuation lines.
    pub margin_x: f32,
    /// Right edge no placed span may cross (except a lone oversized token).
    pub max_width: f32,
    pub line_height: f32,
    /// Square size of resolved emoji images.
    pub emoji_size: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlacedItem {
    /// One or more words (each with its trailing space) from a single text span.
    Text(String),
    /// Emoji image; indexes into the message content.
    Emoji { span_index: usize },
    /// Emoji without an image, drawn as its label.
    EmojiLabel(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedSpan {
    pub x: f32,
    /// Offset of the span's top from the line top.
    pub y: f32,
    pub width: f32,
    pub item: PlacedItem,
}

impl PlacedSpan {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutLine {
    pub spans: Vec<PlacedSpan>,
}

impl LayoutLine {
    pub fn right_extent(&self) -> Option<f32> {
        self.spans.iter().map(PlacedSpan::right).reduce(f32::max)
    }
}

/// Wrap `content` into lines. Always returns at least one line.
pub fn wrap(content: &[Span], params: &WrapParams, measure: &mut dyn TextMeasure) -> Vec<LayoutLine> {
    let mut w = Wrapper::new(params);

    for (span_index, span) in content.iter().enumerate() {
        match span {
            Span::Text { text } => {
                for word in text.split_whitespace() {
                    let token = format!("{word} ");
                    let width = measure.text_width(&token);
                    w.push_word(&token, width);
                }
                w.flush_run();
            }
            Span::Emoji(e) => {
                if e.image.is_some() {
                    let y = ((params.line_height - params.emoji_size) / 2.0).max(0.0);
                    w.push_glyph(params.emoji_size, y, PlacedItem::Emoji { span_index });
                } else if let Some(label) = e.fallback_label.as_deref() {
                    let token = format!("{label} ");
                    let width = measure.text_width(&token);
                    w.push_glyph(width, 0.0, PlacedItem::EmojiLabel(token));
                }
            }
        }
    }

    w.finish()
}

struct Wrapper<'p> {
    params: &'p WrapParams,
    lines: Vec<LayoutLine>,
    x: f32,
    run: String,
    run_x: f32,
    run_width: f32,
}

impl<'p> Wrapper<'p> {
    fn new(params: &'p WrapParams) -> Self {
        Self {
            params,
            lines: vec![LayoutLine::default()],
            x: params.start_x,
            run: String::new(),
            run_x: params.start_x,
            run_width: 0.0,
        }
    }

    // At the margin nothing is gained by breaking, so an oversized token stays put.
    fn fits(&self, width: f32) -> bool {
        self.x + width <= self.params.max_width || self.x <= self.params.margin_x
    }

    fn current_line(&mut self) -> &mut LayoutLine {
        if self.lines.is_empty() {
            self.lines.push(LayoutLine::default());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    fn flush_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        let span = PlacedSpan {
            x: self.run_x,
            y: 0.0,
            width: self.run_width,
            item: PlacedItem::Text(std::mem::take(&mut self.run)),
        };
        self.current_line().spans.push(span);
        self.run_width = 0.0;
    }

    fn break_line(&mut self) {
        self.flush_run();
        self.lines.push(LayoutLine::default());
        self.x = self.params.margin_x;
    }

    fn push_word(&mut self, token: &str, width: f32) {
        if !self.fits(width) {
            self.break_line();
        }
        if self.run.is_empty() {
            self.run_x = self.x;
            self.run_width = 0.0;
        }
        self.run.push_str(token);
        self.run_width += width;
        self.x += width;
    }

    fn push_glyph(&mut self, width: f32, y: f32, item: PlacedItem) {
        if width <= 0.0 {
            return;
        }
        self.flush_run();
        if !self.fits(width) {
            self.break_line();
        }
        let span = PlacedSpan {
            x: self.x,
            y,
            width,
            item,
        };
        self.current_line().spans.push(span);
        self.x += width;
    }

    fn finish(mut self) -> Vec<LayoutLine> {
        self.flush_run();
        self.lines
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/wrap.rs"]
mod tests;

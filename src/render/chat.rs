//! Bottom-anchored chat composition on the CPU rasterizer.
//!
//! Each paint walks backward from the newest revealed message. Blocks stack upward from the
//! bottom margin until the drawing origin leaves the canvas, so per-frame cost is bounded by
//! the canvas height rather than the chat length.

use std::{collections::HashMap, sync::Arc};

use vello_cpu::{
    kurbo::{Affine, Circle, Ellipse, Rect, Shape},
    peniko::{Color, FontData},
};

use crate::{
    assets::decode::PreparedImage,
    chat::model::{ChatMessage, Span},
    config::RenderConfig,
    foundation::{
        core::{Canvas, Rgba8},
        error::{ChatreelError, ChatreelResult},
    },
    layout::{
        text::{TextBrushRgba8, TextLayoutEngine},
        wrap::{LayoutLine, PlacedItem, WrapParams, wrap},
    },
    render::frame::FrameRGBA,
};

/// Produces the current canvas for the frame pump.
pub trait FramePainter {
    fn size(&self) -> (u32, u32);
    /// Redraw with the first `revealed` messages visible.
    fn paint(&mut self, messages: &[ChatMessage], revealed: usize) -> ChatreelResult<()>;
    /// Last painted frame.
    fn frame(&self) -> &FrameRGBA;
}

/// Colors and metrics, derived once from the config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChatStyle {
    pub background: Rgba8,
    pub author_color: Rgba8,
    pub message_color: Rgba8,
    pub font_size: f32,
    pub line_height: f32,
    pub emoji_size: f32,
    /// Zero when avatars are hidden.
    pub avatar_size: f32,
    pub margin: f32,
    pub gutter: f32,
    pub message_spacing: f32,
}

/// Alpha of the disc drawn when a message has no avatar.
const PLACEHOLDER_ALPHA: u8 = 96;

impl ChatStyle {
    pub fn from_config(cfg: &RenderConfig) -> Self {
        let font_size = cfg.font_size;
        let line_height = (font_size * 1.5).ceil();
        Self {
            background: cfg.background,
            author_color: cfg.author_color,
            message_color: cfg.message_color,
            font_size,
            line_height,
            emoji_size: (font_size * 1.3).round(),
            avatar_size: if cfg.skip_avatars { 0.0 } else { line_height },
            margin: (font_size * 0.75).round(),
            gutter: (font_size * 0.5).round(),
            message_spacing: (line_height * 0.25).round(),
        }
    }

    pub fn shows_avatars(&self) -> bool {
        self.avatar_size > 0.0
    }

    /// Left edge of author labels and continuation lines.
    pub fn text_left(&self) -> f32 {
        if self.shows_avatars() {
            self.margin + self.avatar_size + self.gutter
        } else {
            self.margin
        }
    }
}

/// Transient layout of one message, rebuilt on every paint.
struct MessageBlock {
    author: parley::Layout<TextBrushRgba8>,
    lines: Vec<LayoutLine>,
    height: f32,
}

pub struct ChatRenderer {
    canvas: Canvas,
    style: ChatStyle,
    author_text: TextLayoutEngine,
    message_text: TextLayoutEngine,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    images: HashMap<usize, ImagePaint>,
    frame: FrameRGBA,
}

#[derive(Clone)]
struct ImagePaint {
    // Pins the allocation the cache key points at.
    _source: Arc<PreparedImage>,
    paint: vello_cpu::Image,
    w: f64,
    h: f64,
}

impl ChatRenderer {
    pub fn new(
        canvas: Canvas,
        style: ChatStyle,
        author_text: TextLayoutEngine,
        message_text: TextLayoutEngine,
    ) -> ChatreelResult<Self> {
        let (w, h) = canvas_u16(canvas)?;
        Ok(Self {
            canvas,
            style,
            author_text,
            message_text,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            images: HashMap::new(),
            frame: FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: vec![0; canvas.byte_len()],
                premultiplied: true,
            },
        })
    }

    /// Load fonts and derive the style from `cfg`.
    pub fn from_config(cfg: &RenderConfig) -> ChatreelResult<Self> {
        let canvas = cfg.canvas()?;
        let style = ChatStyle::from_config(cfg);
        let message_bytes = std::fs::read(&cfg.font_path).map_err(|e| {
            ChatreelError::input(format!(
                "failed to read font '{}': {e}",
                cfg.font_path.display()
            ))
        })?;
        let author_text = match &cfg.author_font_path {
            Some(path) => TextLayoutEngine::from_font_file(path, style.font_size)?,
            None => TextLayoutEngine::from_font_bytes(message_bytes.clone(), style.font_size)?,
        };
        let message_text = TextLayoutEngine::from_font_bytes(message_bytes, style.font_size)?;
        tracing::debug!(
            message_family = message_text.family_name(),
            author_family = author_text.family_name(),
            "renderer fonts loaded"
        );
        Self::new(canvas, style, author_text, message_text)
    }

    pub fn style(&self) -> &ChatStyle {
        &self.style
    }

    fn layout_message(&mut self, msg: &ChatMessage) -> MessageBlock {
        let style = &self.style;
        let text_left = style.text_left();
        let author = self.author_text.layout(&msg.author, style.author_color.into());
        let params = WrapParams {
            start_x: text_left + author.full_width() + style.gutter,
            margin_x: text_left,
            max_width: self.canvas.width as f32 - style.margin,
            line_height: style.line_height,
            emoji_size: style.emoji_size,
        };
        let lines = wrap(&msg.content, &params, &mut self.message_text);
        let height = (lines.len().max(1) as f32 * style.line_height).max(style.avatar_size);
        MessageBlock {
            author,
            lines,
            height,
        }
    }

    fn draw_message(&mut self, msg: &ChatMessage, block: &MessageBlock, top: f32) {
        let style = self.style;
        let top = top as f64;
        let line_height = style.line_height as f64;

        if style.shows_avatars() {
            let size = style.avatar_size as f64;
            let x = style.margin as f64;
            let y = top + (line_height - size).max(0.0) / 2.0;
            match msg.avatar.as_ref().and_then(|img| self.image_paint(img)) {
                Some(paint) => fill_image(&mut self.ctx, &paint, x, y, size, true),
                None => {
                    self.ctx.set_transform(Affine::IDENTITY);
                    self.ctx.set_paint(color(
                        style.author_color.with_alpha(PLACEHOLDER_ALPHA),
                    ));
                    let r = size / 2.0;
                    self.ctx
                        .fill_path(&Circle::new((x + r, y + r), r).to_path(0.1));
                }
            }
        }

        let author_y = top + (line_height - block.author.height() as f64) / 2.0;
        fill_text(
            &mut self.ctx,
            self.author_text.font_data(),
            &block.author,
            style.text_left() as f64,
            author_y,
        );

        for (i, line) in block.lines.iter().enumerate() {
            let line_top = top + i as f64 * line_height;
            for span in &line.spans {
                let x = span.x as f64;
                match &span.item {
                    PlacedItem::Text(run) | PlacedItem::EmojiLabel(run) => {
                        let layout = self.message_text.layout(run, style.message_color.into());
                        let y = line_top + (line_height - layout.height() as f64) / 2.0;
                        fill_text(&mut self.ctx, self.message_text.font_data(), &layout, x, y);
                    }
                    PlacedItem::Emoji { span_index } => {
                        let Some(Span::Emoji(e)) = msg.content.get(*span_index) else {
                            continue;
                        };
                        let Some(img) = &e.image else {
                            continue;
                        };
                        let Some(paint) = self.image_paint(img) else {
                            continue;
                        };
                        fill_image(
                            &mut self.ctx,
                            &paint,
                            x,
                            line_top + span.y as f64,
                            style.emoji_size as f64,
                            false,
                        );
                    }
                }
            }
        }
    }

    /// Rasterizer paint for `img`, built once per decoded image.
    fn image_paint(&mut self, img: &Arc<PreparedImage>) -> Option<ImagePaint> {
        let key = Arc::as_ptr(img) as usize;
        if let Some(p) = self.images.get(&key) {
            return Some(p.clone());
        }
        let pixmap = match pixmap_from_prepared(img) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "image skipped");
                return None;
            }
        };
        let paint = ImagePaint {
            _source: img.clone(),
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w: img.width.max(1) as f64,
            h: img.height.max(1) as f64,
        };
        self.images.insert(key, paint.clone());
        Some(paint)
    }
}

impl FramePainter for ChatRenderer {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width, self.canvas.height)
    }

    fn paint(&mut self, messages: &[ChatMessage], revealed: usize) -> ChatreelResult<()> {
        let revealed = revealed.min(messages.len());
        let width = self.canvas.width as f64;
        let height = self.canvas.height as f64;

        self.ctx.reset();
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::IDENTITY);
        self.ctx.set_paint(color(self.style.background));
        self.ctx.fill_rect(&Rect::new(0.0, 0.0, width, height));

        let mut bottom = self.canvas.height as f32 - self.style.margin;
        let mut drawn = 0usize;
        for msg in messages[..revealed].iter().rev() {
            if bottom <= 0.0 {
                break;
            }
            let block = self.layout_message(msg);
            let top = bottom - block.height;
            self.draw_message(msg, &block, top);
            bottom = top - self.style.message_spacing;
            drawn += 1;
        }

        self.ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.pixmap);

        let src = self.pixmap.data_as_u8_slice();
        if src.len() != self.frame.data.len() {
            return Err(ChatreelError::render(format!(
                "pixmap holds {} bytes, expected {}",
                src.len(),
                self.frame.data.len()
            )));
        }
        self.frame.data.copy_from_slice(src);
        tracing::trace!(revealed, drawn, "chat painted");
        Ok(())
    }

    fn frame(&self) -> &FrameRGBA {
        &self.frame
    }
}

fn canvas_u16(canvas: Canvas) -> ChatreelResult<(u16, u16)> {
    let w = u16::try_from(canvas.width)
        .map_err(|_| ChatreelError::render("canvas width exceeds u16"))?;
    let h = u16::try_from(canvas.height)
        .map_err(|_| ChatreelError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn color(c: Rgba8) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn fill_text(
    ctx: &mut vello_cpu::RenderContext,
    font: &FontData,
    layout: &parley::Layout<TextBrushRgba8>,
    x: f64,
    y: f64,
) {
    ctx.set_transform(Affine::translate((x, y)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(Color::from_rgba8(brush.r, brush.g, brush.b, brush.a));
            let mut pen_x = run.offset();
            let baseline = run.baseline();
            let glyphs = run.glyphs().map(|g| {
                let glyph = vello_cpu::Glyph {
                    id: g.id,
                    x: pen_x + g.x,
                    y: baseline - g.y,
                };
                pen_x += g.advance;
                glyph
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Draw `paint` scaled into a `size` square at `(x, y)`, clipped to a circle when `round`.
fn fill_image(
    ctx: &mut vello_cpu::RenderContext,
    paint: &ImagePaint,
    x: f64,
    y: f64,
    size: f64,
    round: bool,
) {
    ctx.set_transform(
        Affine::translate((x, y)) * Affine::scale_non_uniform(size / paint.w, size / paint.h),
    );
    ctx.set_paint(paint.paint.clone());
    if round {
        let (rx, ry) = (paint.w / 2.0, paint.h / 2.0);
        ctx.fill_path(&Ellipse::new((rx, ry), (rx, ry), 0.0).to_path(0.1));
    } else {
        ctx.fill_rect(&Rect::new(0.0, 0.0, paint.w, paint.h));
    }
}

fn pixmap_from_prepared(img: &PreparedImage) -> ChatreelResult<vello_cpu::Pixmap> {
    let w = u16::try_from(img.width)
        .map_err(|_| ChatreelError::render("image width exceeds u16"))?;
    let h = u16::try_from(img.height)
        .map_err(|_| ChatreelError::render("image height exceeds u16"))?;
    if img.rgba8_premul.len() != w as usize * h as usize * 4 {
        return Err(ChatreelError::render("image byte len mismatch"));
    }
    let pixels = img
        .rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/chat.rs"]
mod tests;

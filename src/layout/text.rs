use std::{borrow::Cow, collections::HashMap, path::Path};

use vello_cpu::peniko::{Blob, FontData};

use crate::{
    foundation::error::{ChatreelError, ChatreelResult},
    layout::wrap::TextMeasure,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layouts.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<crate::foundation::core::Rgba8> for TextBrushRgba8 {
    fn from(c: crate::foundation::core::Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Single-font, single-size text shaper.
///
/// Holds the Parley contexts plus the font registered into them, and the same bytes as a
/// rasterizer font so glyph ids from layouts can be drawn directly.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font_data: FontData,
    size_px: f32,
    widths: HashMap<String, f32>,
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("family_name", &self.family_name)
            .field("size_px", &self.size_px)
            .field("cached_widths", &self.widths.len())
            .finish()
    }
}

impl TextLayoutEngine {
    pub fn from_font_bytes(font_bytes: Vec<u8>, size_px: f32) -> ChatreelResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ChatreelError::validation(
                "font size must be finite and > 0",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ChatreelError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ChatreelError::validation("registered font family has no name"))?
            .to_string();

        tracing::debug!(family = %family_name, size_px, "font registered");

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font_data: FontData::new(Blob::from(font_bytes), 0),
            size_px,
            widths: HashMap::new(),
        })
    }

    pub fn from_font_file(path: &Path, size_px: f32) -> ChatreelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ChatreelError::input(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_font_bytes(bytes, size_px)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn font_data(&self) -> &FontData {
        &self.font_data
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    /// Shape `text` on a single unbounded line.
    pub fn layout(&mut self, text: &str, brush: TextBrushRgba8) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl TextMeasure for TextLayoutEngine {
    fn text_width(&mut self, text: &str) -> f32 {
        // Parley still reports a line box width for an empty layout.
        if text.is_empty() {
            return 0.0;
        }
        if let Some(w) = self.widths.get(text) {
            return *w;
        }
        let w = self.layout(text, TextBrushRgba8::default()).full_width();
        self.widths.insert(text.to_string(), w);
        w
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/text.rs"]
mod tests;

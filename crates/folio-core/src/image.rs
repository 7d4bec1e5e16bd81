//! The image collaborator.
//!
//! Folio never decodes images itself. Components describe what they want to show with an
//! [`ImageRequest`] and hand it to an [`ImageRenderer`]; apps that can draw real pixels (sixel,
//! kitty graphics, half-blocks) plug in their own renderer. [`AltTextImages`] is the fallback.
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::palette;
use crate::render;
use crate::theme::RenderContext;

/// Approximate pixel size of one terminal cell, used to convert requested sizes.
pub const CELL_WIDTH_PX: u16 = 7;
pub const CELL_HEIGHT_PX: u16 = 14;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObjectFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    pub src: String,
    pub alt: String,
    /// Requested width in px; 0 means "use the available width".
    pub width: u16,
    /// Requested height in px; 0 means "use the available height".
    pub height: u16,
    pub fit: ObjectFit,
}

impl ImageRequest {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
            width: 0,
            height: 0,
            fit: ObjectFit::default(),
        }
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fit(mut self, fit: ObjectFit) -> Self {
        self.fit = fit;
        self
    }

    /// Size in cells, rounded to nearest and at least 1x1. `None` when no size was requested.
    pub fn cell_size(&self) -> Option<(u16, u16)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let cols = (self.width + CELL_WIDTH_PX / 2) / CELL_WIDTH_PX;
        let rows = (self.height + CELL_HEIGHT_PX / 2) / CELL_HEIGHT_PX;
        Some((cols.max(1), rows.max(1)))
    }
}

pub trait ImageRenderer {
    /// Draws the image into `area`.
    fn render(&self, request: &ImageRequest, area: Rect, buf: &mut Buffer, ctx: RenderContext<'_>);

    /// Lines standing in for the image inside flowing text.
    fn inline_lines(
        &self,
        request: &ImageRequest,
        width: u16,
        ctx: RenderContext<'_>,
    ) -> Vec<Line<'static>>;
}

/// Draws a shaded placeholder labelled with the alt text.
#[derive(Clone, Copy, Debug, Default)]
pub struct AltTextImages;

impl AltTextImages {
    fn surface(ctx: RenderContext<'_>) -> Style {
        Style::default()
            .bg(ctx.mode(palette::GRAY_200, palette::GRAY_600))
            .fg(ctx.mode(palette::GRAY_600, palette::GRAY_200))
    }
}

impl ImageRenderer for AltTextImages {
    fn render(&self, request: &ImageRequest, area: Rect, buf: &mut Buffer, ctx: RenderContext<'_>) {
        if area.is_empty() {
            return;
        }
        let surface = Self::surface(ctx);
        render::fill(area, buf, surface);

        let label = render::truncate_with_ellipsis(&request.alt, area.width as usize);
        let label_w = unicode_width::UnicodeWidthStr::width(label.as_str()) as u16;
        let x = area.x + area.width.saturating_sub(label_w) / 2;
        let y = area.y + area.height / 2;
        render::render_spans_clipped(
            x,
            y,
            area.right().saturating_sub(x),
            buf,
            &[Span::styled(label, Style::default().add_modifier(Modifier::ITALIC))],
            surface,
        );
    }

    fn inline_lines(
        &self,
        request: &ImageRequest,
        width: u16,
        ctx: RenderContext<'_>,
    ) -> Vec<Line<'static>> {
        let alt = if request.alt.trim().is_empty() {
            "image"
        } else {
            request.alt.trim()
        };
        let label = render::truncate_with_ellipsis(&format!("▣ {alt}"), width as usize);
        vec![Line::from(Span::styled(
            label,
            Self::surface(ctx).add_modifier(Modifier::ITALIC),
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ColorMode;
    use crate::theme::ThemeConfig;

    #[test]
    fn converts_pixels_to_cells() {
        let req = ImageRequest::new("cover.jpg", "cover").with_size(55, 83);
        assert_eq!(req.cell_size(), Some((8, 6)));
        assert_eq!(ImageRequest::new("a", "b").cell_size(), None);
    }

    #[test]
    fn placeholder_centres_alt_text() {
        let theme = ThemeConfig::default();
        let ctx = RenderContext::new(&theme, ColorMode::Light);
        let area = Rect::new(0, 0, 8, 3);
        let mut buf = Buffer::empty(area);
        AltTextImages.render(&ImageRequest::new("x.png", "cat"), area, &mut buf, ctx);
        let row: String = (0..8).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(row, "  cat   ");
        assert_eq!(buf[(0, 0)].bg, palette::GRAY_200);
    }
}

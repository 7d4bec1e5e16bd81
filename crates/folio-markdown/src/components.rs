//! The fixed table from rich-text tags to styles.
//!
//! Every structural element of a post is drawn with exactly one [`ComponentStyle`]. The only
//! branching is on the color mode carried by the [`RenderContext`].
use folio_core::palette;
use folio_core::theme::RenderContext;
use folio_core::theme::StyleBundle;
use ratatui::style::Modifier;
use ratatui::style::Style;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MdxTag {
    H1,
    H2,
    H3,
    H4,
    P,
    Ul,
    Ol,
    Li,
    Blockquote,
    Table,
    Th,
    Td,
    Img,
    A,
    /// The `#` link shown next to a heading on hover.
    HeadingAnchor,
    Code,
    InlineCode,
    Pre,
    Hr,
    Strong,
    Kbd,
    Br,
}

impl MdxTag {
    pub const ALL: [MdxTag; 22] = [
        MdxTag::H1,
        MdxTag::H2,
        MdxTag::H3,
        MdxTag::H4,
        MdxTag::P,
        MdxTag::Ul,
        MdxTag::Ol,
        MdxTag::Li,
        MdxTag::Blockquote,
        MdxTag::Table,
        MdxTag::Th,
        MdxTag::Td,
        MdxTag::Img,
        MdxTag::A,
        MdxTag::HeadingAnchor,
        MdxTag::Code,
        MdxTag::InlineCode,
        MdxTag::Pre,
        MdxTag::Hr,
        MdxTag::Strong,
        MdxTag::Kbd,
        MdxTag::Br,
    ];

    /// Heading tag for a level; levels past 4 render as h4.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => MdxTag::H1,
            2 => MdxTag::H2,
            3 => MdxTag::H3,
            _ => MdxTag::H4,
        }
    }

    /// Text drawn before the element's content: list bullet, quote bar, rule glyph, the gap
    /// before a heading anchor.
    pub fn prefix(self) -> &'static str {
        match self {
            MdxTag::Ul => "• ",
            MdxTag::Blockquote => "▎ ",
            MdxTag::HeadingAnchor => " ",
            MdxTag::Hr => "─",
            _ => "",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MdxTag::H1 => "h1",
            MdxTag::H2 => "h2",
            MdxTag::H3 => "h3",
            MdxTag::H4 => "h4",
            MdxTag::P => "p",
            MdxTag::Ul => "ul",
            MdxTag::Ol => "ol",
            MdxTag::Li => "li",
            MdxTag::Blockquote => "blockquote",
            MdxTag::Table => "table",
            MdxTag::Th => "th",
            MdxTag::Td => "td",
            MdxTag::Img => "img",
            MdxTag::A => "a",
            MdxTag::HeadingAnchor => "anchor",
            MdxTag::Code => "code",
            MdxTag::InlineCode => "inlineCode",
            MdxTag::Pre => "pre",
            MdxTag::Hr => "hr",
            MdxTag::Strong => "strong",
            MdxTag::Kbd => "kbd",
            MdxTag::Br => "br",
        }
    }
}

/// How one tag is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentStyle {
    pub style: Style,
    /// The theme bundle applied to the element, if any.
    pub bundle: Option<StyleBundle>,
    /// See [`MdxTag::prefix`].
    pub prefix: &'static str,
    /// Blank lines before the element.
    pub margin_top: u16,
    /// Blank lines after the element.
    pub margin_bottom: u16,
}

impl ComponentStyle {
    fn new(tag: MdxTag, style: Style) -> Self {
        Self {
            style,
            bundle: None,
            prefix: tag.prefix(),
            margin_top: 0,
            margin_bottom: 0,
        }
    }

    /// Applies a theme bundle: its font modifiers and margins.
    fn bundled(mut self, bundle: StyleBundle, ctx: RenderContext<'_>) -> Self {
        let attrs = ctx.bundle(bundle);
        self.style = self.style.add_modifier(attrs.modifiers());
        self.bundle = Some(bundle);
        self.margin_top = attrs.margin_top;
        self.margin_bottom = attrs.margin_bottom;
        self
    }

    fn margins(mut self, top: u16, bottom: u16) -> Self {
        self.margin_top = top;
        self.margin_bottom = bottom;
        self
    }
}

/// The tag table.
#[derive(Clone, Copy, Debug, Default)]
pub struct MdxComponents;

impl MdxComponents {
    pub fn style(tag: MdxTag, ctx: RenderContext<'_>) -> ComponentStyle {
        let text = ctx.text_style();
        let heading = ComponentStyle::new(tag, ctx.heading_style());
        match tag {
            MdxTag::H1 => heading.bundled(StyleBundle::H1, ctx),
            MdxTag::H2 => heading.bundled(StyleBundle::H2, ctx),
            MdxTag::H3 => heading.bundled(StyleBundle::H3, ctx),
            MdxTag::H4 => heading.bundled(StyleBundle::H4, ctx),
            MdxTag::P => ComponentStyle::new(tag, text).bundled(StyleBundle::P, ctx),
            MdxTag::Ul | MdxTag::Ol => ComponentStyle::new(tag, text).bundled(StyleBundle::Ul, ctx),
            MdxTag::Li | MdxTag::Td => ComponentStyle::new(tag, text),
            MdxTag::Blockquote => {
                let style = Style::default()
                    .fg(ctx.mode(palette::ORANGE_800, palette::ORANGE_200))
                    .bg(ctx.mode(palette::ORANGE_100, palette::ORANGE_200_16_ON_DARK));
                ComponentStyle::new(tag, style).margins(1, 1)
            }
            MdxTag::Table => ComponentStyle::new(tag, text).margins(1, 1),
            MdxTag::Th => {
                let style = text
                    .bg(ctx.mode(palette::GRAY_50, palette::WHITE_ALPHA_100_ON_DARK))
                    .add_modifier(Modifier::BOLD);
                ComponentStyle::new(tag, style)
            }
            MdxTag::Img => ComponentStyle::new(tag, Style::default()).margins(1, 1),
            MdxTag::A => {
                let style = Style::default()
                    .fg(ctx.mode(palette::PURPLE_500, palette::PURPLE_300))
                    .add_modifier(Modifier::UNDERLINED);
                ComponentStyle::new(tag, style)
            }
            MdxTag::HeadingAnchor => {
                let style = Style::default()
                    .fg(palette::PURPLE_500)
                    .add_modifier(Modifier::HIDDEN);
                ComponentStyle::new(tag, style)
            }
            MdxTag::Code => {
                ComponentStyle::new(tag, Style::default()).bundled(StyleBundle::Code, ctx)
            }
            MdxTag::InlineCode => {
                let style = Style::default()
                    .fg(ctx.mode(palette::PURPLE_500, palette::PURPLE_200))
                    .bg(ctx.mode(palette::PURPLE_50, palette::PURPLE_900));
                ComponentStyle::new(tag, style).bundled(StyleBundle::Code, ctx)
            }
            MdxTag::Pre => {
                let style = Style::default().bg(ctx.mode(palette::GRAY_50, palette::GRAY_900));
                ComponentStyle::new(tag, style).margins(1, 1)
            }
            MdxTag::Hr => {
                let style = Style::default().fg(ctx.mode(palette::GRAY_200, palette::GRAY_600));
                ComponentStyle::new(tag, style).bundled(StyleBundle::Hr, ctx)
            }
            MdxTag::Strong => {
                ComponentStyle::new(tag, Style::default().add_modifier(Modifier::BOLD))
            }
            MdxTag::Kbd => {
                let style = Style::default()
                    .bg(ctx.mode(palette::GRAY_100, palette::WHITE_ALPHA_100_ON_DARK))
                    .add_modifier(Modifier::BOLD);
                ComponentStyle::new(tag, style)
            }
            MdxTag::Br => ComponentStyle::new(tag, Style::default()),
        }
    }
}

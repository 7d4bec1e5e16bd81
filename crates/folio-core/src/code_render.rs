use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;
use unicode_width::UnicodeWidthStr;

use crate::palette;
use crate::text::CodeHighlighter;
use crate::text::NoHighlight;
use crate::text::Token;
use crate::text::TokenKind;
use crate::text::merge_adjacent;
use crate::theme::ColorMode;
use crate::theme::RenderContext;

/// Languages rendered without a line-number gutter.
pub const UNNUMBERED_LANGUAGES: &[&str] = &["shell", "text"];

/// Normalizes a code fence tag: strips a `language-` prefix and surrounding whitespace.
///
/// Returns `None` for a missing or empty tag, which renders as an unknown language.
pub fn normalize_language(tag: Option<&str>) -> Option<String> {
    let tag = tag?.trim();
    let tag = tag.strip_prefix("language-").unwrap_or(tag).trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

pub fn line_numbers_enabled(language: Option<&str>) -> bool {
    language.is_some_and(|lang| !UNNUMBERED_LANGUAGES.contains(&lang))
}

/// Token colors for one color mode, plus the code block surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodePalette {
    pub pre_background: Color,
    pub line_number: Color,
    pub plain: Style,
    pub comment: Style,
    pub string: Style,
    pub number: Style,
    pub boolean: Style,
    pub constant: Style,
    pub builtin: Style,
    pub function: Style,
    pub class_name: Style,
    pub keyword: Style,
    pub operator: Style,
    pub punctuation: Style,
    pub variable: Style,
    pub property: Style,
    pub tag: Style,
    pub attr_name: Style,
    pub namespace: Style,
    pub inserted: Style,
    pub deleted: Style,
}

fn fg(r: u8, g: u8, b: u8) -> Style {
    Style::default().fg(Color::Rgb(r, g, b))
}

impl CodePalette {
    pub fn for_mode(mode: ColorMode) -> Self {
        mode.pick(Self::night_owl_light(), Self::night_owl())
    }

    /// Night Owl, used in dark mode.
    pub fn night_owl() -> Self {
        let italic = Modifier::ITALIC;
        Self {
            pre_background: palette::GRAY_900,
            line_number: palette::WHITE_ALPHA_500_ON_GRAY_900,
            plain: fg(214, 222, 235),
            comment: fg(99, 119, 119).add_modifier(italic),
            string: fg(173, 219, 103),
            number: fg(247, 140, 108),
            boolean: fg(255, 88, 116),
            constant: fg(130, 170, 255),
            builtin: fg(130, 170, 255),
            function: fg(130, 170, 255),
            class_name: fg(255, 203, 139),
            keyword: fg(127, 219, 202),
            operator: fg(127, 219, 202),
            punctuation: fg(199, 146, 234),
            variable: fg(214, 222, 235),
            property: fg(128, 203, 196),
            tag: fg(127, 219, 202),
            attr_name: fg(173, 219, 103).add_modifier(italic),
            namespace: fg(178, 204, 214),
            inserted: fg(173, 219, 103).add_modifier(italic),
            deleted: fg(144, 57, 60).add_modifier(italic),
        }
    }

    /// Night Owl Light, used in light mode.
    pub fn night_owl_light() -> Self {
        let italic = Modifier::ITALIC;
        Self {
            pre_background: palette::GRAY_50,
            line_number: palette::BLACK_ALPHA_500_ON_GRAY_50,
            plain: fg(64, 63, 83),
            comment: fg(152, 159, 177).add_modifier(italic),
            string: fg(72, 118, 214),
            number: fg(170, 9, 130),
            boolean: fg(188, 84, 84),
            constant: fg(72, 118, 214),
            builtin: fg(72, 118, 214),
            function: fg(153, 76, 195).add_modifier(italic),
            class_name: fg(17, 17, 17),
            keyword: fg(12, 150, 155),
            operator: fg(12, 150, 155),
            punctuation: fg(153, 76, 195),
            variable: fg(201, 103, 101),
            property: fg(12, 150, 155),
            tag: fg(153, 76, 195),
            attr_name: fg(72, 118, 214).add_modifier(italic),
            namespace: fg(12, 150, 155),
            inserted: fg(72, 118, 214).add_modifier(italic),
            deleted: fg(243, 157, 156).add_modifier(italic),
        }
    }

    pub fn style_for(&self, kind: TokenKind) -> Style {
        let style = match kind {
            TokenKind::Plain => self.plain,
            TokenKind::Comment => self.comment,
            TokenKind::String => self.string,
            TokenKind::Number => self.number,
            TokenKind::Boolean => self.boolean,
            TokenKind::Constant => self.constant,
            TokenKind::Builtin => self.builtin,
            TokenKind::Function => self.function,
            TokenKind::ClassName => self.class_name,
            TokenKind::Keyword => self.keyword,
            TokenKind::Operator => self.operator,
            TokenKind::Punctuation => self.punctuation,
            TokenKind::Variable => self.variable,
            TokenKind::Property => self.property,
            TokenKind::Tag => self.tag,
            TokenKind::AttrName => self.attr_name,
            TokenKind::Namespace => self.namespace,
            TokenKind::Inserted => self.inserted,
            TokenKind::Deleted => self.deleted,
        };
        style.bg(self.pre_background)
    }

    pub fn base_style(&self) -> Style {
        self.plain.bg(self.pre_background)
    }

    pub fn gutter_style(&self) -> Style {
        Style::default()
            .fg(self.line_number)
            .bg(self.pre_background)
    }
}

/// Layout options for [`render_code_block`].
#[derive(Clone, Copy, Debug)]
pub struct CodeRenderOptions {
    /// Blank columns before the gutter (or the code when unnumbered).
    pub padding: usize,
    /// Minimum width of the right-aligned line number.
    pub min_gutter_width: usize,
    /// Blank columns between the line number and the code.
    pub line_number_padding: usize,
}

impl Default for CodeRenderOptions {
    fn default() -> Self {
        Self {
            padding: 1,
            min_gutter_width: 2,
            line_number_padding: 2,
        }
    }
}

/// One displayed line: its 1-based number (when numbered) and its tokens in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeLine {
    pub number: Option<usize>,
    pub tokens: Vec<Token>,
}

impl CodeLine {
    pub fn plain_text(&self) -> String {
        self.tokens.iter().map(|t| t.content.as_str()).collect()
    }
}

/// Color-independent result of tokenizing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenizedCode {
    pub language: Option<String>,
    pub class_name: String,
    pub lines: Vec<CodeLine>,
}

/// Tokenizes `code` into display lines.
///
/// The highlighter is called once for the whole block. The final line is dropped when it is
/// empty, which removes the artifact of a trailing newline. Blocks without a language, or in a
/// language the highlighter does not support, skip the highlighter and render as plain tokens.
pub fn tokenize_code_block(
    code: &str,
    language: Option<&str>,
    highlighter: Option<&dyn CodeHighlighter>,
) -> TokenizedCode {
    let language = normalize_language(language);
    let highlighter: &dyn CodeHighlighter = match (language.as_deref(), highlighter) {
        (Some(lang), Some(hi)) if hi.supports_language(lang) => hi,
        (Some(lang), Some(_)) => {
            tracing::debug!(language = lang, "unsupported language, rendering as plain text");
            &NoHighlight
        }
        (Some(_), None) => &NoHighlight,
        (None, _) => {
            tracing::debug!("code block without a language, rendering as plain text");
            &NoHighlight
        }
    };

    let raw_lines = code.split('\n').count();
    let mut tokenized = highlighter.tokenize_text(language.as_deref(), code);
    if tokenized.len() != raw_lines {
        tracing::warn!(
            expected = raw_lines,
            got = tokenized.len(),
            "highlighter returned a mismatched line count"
        );
    }
    tokenized.resize_with(raw_lines, Vec::new);
    if code.is_empty() || code.ends_with('\n') {
        tokenized.pop();
    }

    let numbered = line_numbers_enabled(language.as_deref());
    let lines = tokenized
        .into_iter()
        .enumerate()
        .map(|(idx, tokens)| CodeLine {
            number: numbered.then_some(idx + 1),
            tokens: merge_adjacent(tokens),
        })
        .collect();

    TokenizedCode {
        class_name: highlighter.class_name(language.as_deref()),
        language,
        lines,
    }
}

/// Styles tokenized lines for the active color mode.
///
/// Only span styles depend on `ctx`; the span and line counts are the same in every mode.
pub fn style_code_lines(
    lines: &[CodeLine],
    ctx: RenderContext<'_>,
    options: CodeRenderOptions,
) -> Vec<Line<'static>> {
    let palette = CodePalette::for_mode(ctx.color_mode);
    let base = palette.base_style();
    let gutter = palette.gutter_style();
    let gutter_w = lines
        .iter()
        .filter_map(|l| l.number)
        .max()
        .map(|n| digits(n).max(options.min_gutter_width));

    lines
        .iter()
        .map(|line| {
            let mut spans: Vec<Span<'static>> = Vec::with_capacity(line.tokens.len() + 2);
            if options.padding > 0 {
                spans.push(Span::styled(" ".repeat(options.padding), base));
            }
            if let (Some(n), Some(width)) = (line.number, gutter_w) {
                let pad = " ".repeat(options.line_number_padding);
                spans.push(Span::styled(format!("{n:>width$}{pad}"), gutter));
            }
            spans.extend(
                line.tokens
                    .iter()
                    .map(|t| Span::styled(t.content.clone(), palette.style_for(t.kind))),
            );
            Line::from(spans).style(base)
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct RenderedCode {
    pub tokenized: TokenizedCode,
    /// Fully materialized lines ready for drawing via `Paragraph`/custom rendering.
    pub lines: Vec<Line<'static>>,
    /// Maximum display width (in terminal cell units) across all rendered lines.
    pub content_width: u32,
    /// Total number of rendered lines.
    pub content_height: u32,
}

impl RenderedCode {
    pub fn class_name(&self) -> &str {
        &self.tokenized.class_name
    }

    pub fn code_lines(&self) -> &[CodeLine] {
        &self.tokenized.lines
    }

    /// Re-styles the same tokens for another color mode without re-tokenizing.
    pub fn restyle(&self, ctx: RenderContext<'_>, options: CodeRenderOptions) -> Text<'static> {
        Text::from(style_code_lines(&self.tokenized.lines, ctx, options))
    }

    pub fn into_text(self) -> Text<'static> {
        Text::from(self.lines)
    }
}

/// Renders a code block: tokenize once, drop the trailing empty line, number, and style.
pub fn render_code_block(
    code: &str,
    language: Option<&str>,
    highlighter: Option<&dyn CodeHighlighter>,
    ctx: RenderContext<'_>,
    options: CodeRenderOptions,
) -> RenderedCode {
    let tokenized = tokenize_code_block(code, language, highlighter);
    let lines = style_code_lines(&tokenized.lines, ctx, options);
    let content_width = lines
        .iter()
        .map(|l| {
            l.spans
                .iter()
                .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
                .sum::<usize>() as u32
        })
        .max()
        .unwrap_or(0);

    RenderedCode {
        content_height: lines.len() as u32,
        content_width,
        lines,
        tokenized,
    }
}

fn digits(mut n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let mut d = 0;
    while n > 0 {
        n /= 10;
        d += 1;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeConfig;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[derive(Default)]
    struct CountingHighlighter {
        calls: AtomicUsize,
    }

    impl CodeHighlighter for CountingHighlighter {
        fn tokenize_lines(&self, _language: Option<&str>, lines: &[&str]) -> Vec<Vec<Token>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lines
                .iter()
                .map(|l| {
                    l.split_inclusive(' ')
                        .map(|w| Token::new(w, TokenKind::Keyword))
                        .collect()
                })
                .collect()
        }
    }

    /// Returns a fixed number of lines whatever the input.
    struct FixedLines(usize);

    impl CodeHighlighter for FixedLines {
        fn tokenize_lines(&self, _language: Option<&str>, _lines: &[&str]) -> Vec<Vec<Token>> {
            (0..self.0)
                .map(|i| vec![Token::new(format!("l{i}"), TokenKind::Keyword)])
                .collect()
        }
    }

    #[derive(Default)]
    struct PythonOnly {
        calls: AtomicUsize,
    }

    impl CodeHighlighter for PythonOnly {
        fn tokenize_lines(&self, _language: Option<&str>, lines: &[&str]) -> Vec<Vec<Token>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lines
                .iter()
                .map(|l| vec![Token::new(*l, TokenKind::Keyword)])
                .collect()
        }

        fn supports_language(&self, language: &str) -> bool {
            language == "python"
        }
    }

    #[test]
    fn short_highlighter_output_is_padded_to_source_lines() {
        let code = tokenize_code_block("a\nb\nc\n", Some("python"), Some(&FixedLines(1)));
        assert_eq!(code.lines.len(), 3);
        assert_eq!(code.lines[0].tokens, vec![Token::new("l0", TokenKind::Keyword)]);
        assert!(code.lines[1].tokens.is_empty());
        assert!(code.lines[2].tokens.is_empty());
        assert_eq!(code.lines[2].number, Some(3));
    }

    #[test]
    fn long_highlighter_output_is_cut_to_source_lines() {
        let code = tokenize_code_block("a\nb\nc\n", Some("python"), Some(&FixedLines(7)));
        assert_eq!(code.lines.len(), 3);
        assert_eq!(code.lines[2].tokens, vec![Token::new("l2", TokenKind::Keyword)]);

        let code = tokenize_code_block("a\nb", Some("python"), Some(&FixedLines(7)));
        assert_eq!(code.lines.len(), 2);
    }

    #[test]
    fn unsupported_language_skips_highlighter() {
        let hi = PythonOnly::default();
        let code = tokenize_code_block("x = 1\n", Some("cobol"), Some(&hi));
        assert_eq!(hi.calls.load(Ordering::SeqCst), 0);
        assert_eq!(code.lines[0].tokens, vec![Token::plain("x = 1")]);
        assert_eq!(code.class_name, "language-cobol");

        let code = tokenize_code_block("x = 1\n", Some("python"), Some(&hi));
        assert_eq!(hi.calls.load(Ordering::SeqCst), 1);
        assert_eq!(code.lines[0].tokens, vec![Token::new("x = 1", TokenKind::Keyword)]);
    }

    #[test]
    fn tokenizes_once_for_all_lines() {
        let hi = CountingHighlighter::default();
        let theme = ThemeConfig::default();
        let _ = render_code_block(
            "a\nb\nc\n",
            Some("rs"),
            Some(&hi),
            RenderContext::new(&theme, ColorMode::Light),
            CodeRenderOptions::default(),
        );
        assert_eq!(hi.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drops_trailing_empty_line_and_numbers_from_one() {
        let code = tokenize_code_block("a\nb\n", Some("python"), None);
        assert_eq!(code.lines.len(), 2);
        assert_eq!(code.lines[0].number, Some(1));
        assert_eq!(code.lines[1].number, Some(2));
        assert_eq!(code.lines[0].tokens, vec![Token::plain("a")]);
        assert_eq!(code.lines[1].tokens, vec![Token::plain("b")]);
        assert_eq!(code.class_name, "language-python");
    }

    #[test]
    fn keeps_last_line_without_trailing_newline() {
        let code = tokenize_code_block("a\nb", Some("python"), None);
        assert_eq!(code.lines.len(), 2);
        assert!(tokenize_code_block("", Some("python"), None).lines.is_empty());
    }

    #[test]
    fn shell_and_text_are_unnumbered() {
        for lang in ["shell", "text", "language-shell"] {
            let code = tokenize_code_block("ls\npwd\n", Some(lang), None);
            assert!(code.lines.iter().all(|l| l.number.is_none()), "{lang}");
        }
        assert!(line_numbers_enabled(Some("bash")));
    }

    #[test]
    fn missing_language_is_plain_and_unnumbered() {
        let hi = CountingHighlighter::default();
        for lang in [None, Some(""), Some("language-"), Some("  ")] {
            let code = tokenize_code_block("x = 1\n", lang, Some(&hi));
            assert_eq!(code.language, None);
            assert_eq!(code.class_name, "language-none");
            assert_eq!(code.lines, vec![CodeLine {
                number: None,
                tokens: vec![Token::plain("x = 1")],
            }]);
        }
        assert_eq!(hi.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn renders_right_aligned_gutter() {
        let theme = ThemeConfig::default();
        let source = (1..=10).map(|i| format!("l{i}\n")).collect::<String>();
        let rendered = render_code_block(
            &source,
            Some("rust"),
            None,
            RenderContext::new(&theme, ColorMode::Light),
            CodeRenderOptions::default(),
        );
        assert_eq!(rendered.content_height, 10);
        assert_eq!(plain(&rendered.lines[0]), "  1  l1");
        assert_eq!(plain(&rendered.lines[9]), " 10  l10");
        assert_eq!(rendered.content_width, 8);
    }

    #[test]
    fn color_mode_changes_styles_only() {
        let theme = ThemeConfig::default();
        let hi = CountingHighlighter::default();
        let light_ctx = RenderContext::new(&theme, ColorMode::Light);
        let rendered = render_code_block(
            "fn main() {}\nlet x = 1;\n",
            Some("rust"),
            Some(&hi),
            light_ctx,
            CodeRenderOptions::default(),
        );
        let light = rendered.clone().into_text();
        let dark = rendered.restyle(
            light_ctx.with_color_mode(ColorMode::Dark),
            CodeRenderOptions::default(),
        );

        assert_eq!(light.lines.len(), dark.lines.len());
        for (l, d) in light.lines.iter().zip(dark.lines.iter()) {
            assert_eq!(l.spans.len(), d.spans.len());
            assert_eq!(plain(l), plain(d));
            assert_ne!(l.style.bg, d.style.bg);
        }
        assert_eq!(light.lines[0].style.bg, Some(palette::GRAY_50));
        assert_eq!(dark.lines[0].style.bg, Some(palette::GRAY_900));
    }

    #[test]
    fn gutter_uses_line_number_color() {
        let theme = ThemeConfig::default();
        let rendered = render_code_block(
            "a\n",
            Some("go"),
            None,
            RenderContext::new(&theme, ColorMode::Dark),
            CodeRenderOptions::default(),
        );
        let gutter = &rendered.lines[0].spans[1];
        assert_eq!(gutter.style.fg, Some(palette::WHITE_ALPHA_500_ON_GRAY_900));
    }
}

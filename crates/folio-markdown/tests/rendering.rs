use folio_core::image::AltTextImages;
use folio_core::image::ImageRenderer;
use folio_core::image::ImageRequest;
use folio_core::palette;
use folio_core::text::CodeHighlighter;
use folio_core::theme::ColorMode;
use folio_core::theme::RenderContext;
use folio_core::theme::ThemeConfig;
use folio_markdown::MarkdownDocument;
use folio_markdown::MarkdownRenderOptions;
use folio_markdown::RenderedMarkdown;
use folio_syntax::syntect::SyntectHighlighter;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use std::cell::RefCell;

const POST: &str = r#"# Shipping a blog in Rust

Some intro text with a [relative link](notes/) and `inline code`.

## Getting started

```python
def greet(name):
    return f"hi {name}"
```

```shell
cargo run
```

> Quotes keep their accent bar.

![A cover](covers/rust.png)

| Crate | Version |
|-------|--------:|
| ratatui | 0.29 |
"#;

fn line_to_plain(line: &Line<'_>) -> String {
    line.spans
        .iter()
        .map(|s| s.content.as_ref())
        .collect::<Vec<_>>()
        .join("")
}

fn plain_lines(rendered: &RenderedMarkdown) -> Vec<String> {
    rendered.text().lines.iter().map(line_to_plain).collect()
}

fn options() -> MarkdownRenderOptions {
    MarkdownRenderOptions {
        base_url: Some("https://blog.example.com/posts/".to_string()),
        ..MarkdownRenderOptions::default()
    }
}

fn render(
    doc: &MarkdownDocument,
    mode: ColorMode,
    highlighter: Option<&dyn CodeHighlighter>,
    images: &dyn ImageRenderer,
) -> RenderedMarkdown {
    let theme = ThemeConfig::default();
    doc.render(60, RenderContext::new(&theme, mode), highlighter, images)
}

#[derive(Default)]
struct RecordingImages {
    requests: RefCell<Vec<(ImageRequest, u16)>>,
}

impl ImageRenderer for RecordingImages {
    fn render(&self, _request: &ImageRequest, _area: Rect, _buf: &mut Buffer, _ctx: RenderContext<'_>) {}

    fn inline_lines(
        &self,
        request: &ImageRequest,
        width: u16,
        _ctx: RenderContext<'_>,
    ) -> Vec<Line<'static>> {
        self.requests.borrow_mut().push((request.clone(), width));
        vec![Line::from("[img]"), Line::from("[img]")]
    }
}

#[test]
fn post_renders_every_block() {
    let doc = MarkdownDocument::parse(POST, &options());
    let hi = SyntectHighlighter::new();
    let rendered = render(&doc, ColorMode::Light, Some(&hi), &AltTextImages);
    let lines = plain_lines(&rendered);

    assert_eq!(lines[0], "Shipping a blog in Rust #");
    assert!(lines.contains(&"Getting started #".to_string()));
    assert!(lines.contains(&"  1  def greet(name):".to_string()), "{lines:#?}");
    assert!(lines.contains(&"  2      return f\"hi {name}\"".to_string()));
    assert!(lines.contains(&" cargo run".to_string()));
    assert!(lines.contains(&"▎ Quotes keep their accent bar.".to_string()));
    assert!(lines.contains(&"▣ A cover".to_string()));
    assert!(lines.contains(&" Crate   │ Version ".to_string()), "{lines:#?}");
    assert!(lines.contains(&" ratatui │    0.29 ".to_string()));

    let slugs: Vec<&str> = rendered.anchors().iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, vec!["shipping-a-blog-in-rust", "getting-started"]);
}

#[test]
fn highlighting_changes_styles_not_text() {
    let doc = MarkdownDocument::parse(POST, &options());
    let hi = SyntectHighlighter::new();
    let highlighted = render(&doc, ColorMode::Dark, Some(&hi), &AltTextImages);
    let plain = render(&doc, ColorMode::Dark, None, &AltTextImages);
    assert_eq!(plain_lines(&highlighted), plain_lines(&plain));
}

#[test]
fn toggling_color_mode_keeps_layout() {
    let doc = MarkdownDocument::parse(POST, &options());
    let hi = SyntectHighlighter::new();
    let light = render(&doc, ColorMode::Light, Some(&hi), &AltTextImages);
    let dark = render(&doc, ColorMode::Dark, Some(&hi), &AltTextImages);

    assert_eq!(plain_lines(&light), plain_lines(&dark));
    assert_eq!(light.content_size(), dark.content_size());
    assert_eq!(light.anchors(), dark.anchors());
    for (l, d) in light.text().lines.iter().zip(&dark.text().lines) {
        assert_eq!(l.spans.len(), d.spans.len());
    }

    let code_line = light
        .text()
        .lines
        .iter()
        .position(|l| line_to_plain(l).contains("def greet"))
        .expect("code line");
    assert_eq!(light.text().lines[code_line].style.bg, Some(palette::GRAY_50));
    assert_eq!(dark.text().lines[code_line].style.bg, Some(palette::GRAY_900));
}

#[test]
fn images_resolve_against_base_url() {
    let doc = MarkdownDocument::parse(POST, &options());
    let images = RecordingImages::default();
    let rendered = render(&doc, ColorMode::Light, None, &images);

    let requests = images.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].0.src,
        "https://blog.example.com/posts/covers/rust.png"
    );
    assert_eq!(requests[0].0.alt, "A cover");
    assert_eq!(requests[0].1, 60);
    let count = plain_lines(&rendered).iter().filter(|l| *l == "[img]").count();
    assert_eq!(count, 2);
}

#[test]
fn links_resolve_and_hit_test() {
    let doc = MarkdownDocument::parse(POST, &options());
    let rendered = render(&doc, ColorMode::Light, None, &AltTextImages);

    let link = rendered
        .links()
        .iter()
        .find(|l| l.href.starts_with("https://"))
        .expect("body link");
    assert_eq!(link.href, "https://blog.example.com/posts/notes/");
    assert_eq!(rendered.link_at(link.start, link.line), Some(link.href.as_str()));
    assert_eq!(rendered.link_at(0, 0), Some("#shipping-a-blog-in-rust"));

    let target = rendered.anchor("getting-started").expect("anchor");
    assert_eq!(
        line_to_plain(&rendered.text().lines[target.line]),
        "Getting started #"
    );
}

#[test]
fn hidden_anchor_is_drawn_hidden_until_hovered() {
    let doc = MarkdownDocument::parse("## Notes\n", &MarkdownRenderOptions::default());
    let mut rendered = render(&doc, ColorMode::Light, None, &AltTextImages);

    let area = Rect::new(0, 0, 20, 1);
    let mut buf = Buffer::empty(area);
    Paragraph::new(rendered.text().clone()).render(area, &mut buf);
    assert_eq!(buf[(6, 0)].symbol(), "#");
    assert!(buf[(6, 0)].modifier.contains(Modifier::HIDDEN));

    assert!(rendered.hover_line(0));
    let mut buf = Buffer::empty(area);
    Paragraph::new(rendered.text().clone()).render(area, &mut buf);
    assert!(!buf[(6, 0)].modifier.contains(Modifier::HIDDEN));
    assert_eq!(buf[(6, 0)].fg, palette::PURPLE_500);
}

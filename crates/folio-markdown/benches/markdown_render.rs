use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use folio_core::image::AltTextImages;
use folio_core::text::NoHighlight;
use folio_core::theme::ColorMode;
use folio_core::theme::RenderContext;
use folio_core::theme::ThemeConfig;
use folio_markdown::MarkdownDocument;
use folio_markdown::MarkdownRenderOptions;
use folio_syntax::syntect::SyntectHighlighter;

fn sample_markdown(code_lines: usize) -> String {
    let mut s = String::new();
    s.push_str("# Performance\n\n");
    s.push_str("This is a long paragraph to stress wrapping. ");
    for _ in 0..12 {
        s.push_str("The quick brown fox jumps over the lazy dog. ");
    }
    s.push_str("\n\n");

    s.push_str("## Task List\n\n");
    s.push_str("- [x] task list item\n");
    s.push_str("- [ ] task list item\n\n");

    s.push_str("## Table\n\n");
    s.push_str("| Name | Value | Notes |\n");
    s.push_str("|:-----|------:|:------|\n");
    s.push_str("| foo  | 123   | left / right alignment |\n");
    s.push_str("| bar  | 456   | truncates when the terminal is narrow |\n\n");

    s.push_str("## Code\n\n");
    s.push_str("```rust\n");
    s.push_str("fn main() {\n");
    for i in 0..code_lines {
        s.push_str(&format!("    let x{i} = {i} + 1;\n"));
    }
    s.push_str("    println!(\"done\");\n");
    s.push_str("}\n");
    s.push_str("```\n");
    s
}

fn bench_parse_and_render_no_highlight(c: &mut Criterion) {
    let theme = ThemeConfig::default();
    let md = sample_markdown(200);
    let options = MarkdownRenderOptions::default();
    c.bench_function("markdown/parse+render/no_highlight", |b| {
        b.iter(|| {
            let doc = MarkdownDocument::parse(black_box(md.as_str()), &options);
            let ctx = RenderContext::new(&theme, ColorMode::Light);
            let rendered = doc.render(black_box(96), ctx, Some(&NoHighlight), &AltTextImages);
            black_box(rendered.content_size());
        })
    });
}

fn bench_render_syntect(c: &mut Criterion) {
    let theme = ThemeConfig::default();
    let md = sample_markdown(200);
    let doc = MarkdownDocument::parse(md, &MarkdownRenderOptions::default());
    let hi = SyntectHighlighter::new();
    c.bench_function("markdown/render/syntect", |b| {
        b.iter(|| {
            let ctx = RenderContext::new(&theme, ColorMode::Dark);
            let rendered = doc.render(black_box(96), ctx, Some(&hi), &AltTextImages);
            black_box(rendered.content_size());
        })
    });
}

fn bench_color_mode_toggle(c: &mut Criterion) {
    let theme = ThemeConfig::default();
    let md = sample_markdown(50);
    let doc = MarkdownDocument::parse(md, &MarkdownRenderOptions::default());
    c.bench_function("markdown/render/toggle_color_mode", |b| {
        let mut mode = ColorMode::Light;
        b.iter(|| {
            mode = mode.toggle();
            let ctx = RenderContext::new(&theme, mode);
            let rendered = doc.render(96, ctx, None, &AltTextImages);
            black_box(rendered.text().lines.len());
        })
    });
}

criterion_group!(
    benches,
    bench_parse_and_render_no_highlight,
    bench_render_syntect,
    bench_color_mode_toggle
);
criterion_main!(benches);

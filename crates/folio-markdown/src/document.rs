//! The markdown render core: parse once, render per width and color mode.
//!
//! [`MarkdownDocument::parse`] turns a post into color-free blocks. [`MarkdownDocument::render`]
//! lays them out for a width and a [`RenderContext`], so switching the color mode only
//! re-resolves styles: the lines, spans and anchors stay the same.
use std::mem;

use folio_core::code_render::CodeRenderOptions;
use folio_core::code_render::render_code_block;
use folio_core::image::ImageRenderer;
use folio_core::image::ImageRequest;
use folio_core::text::CodeHighlighter;
use folio_core::theme::RenderContext;
use pulldown_cmark::Alignment;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;
use url::Url;

use crate::components::MdxComponents;
use crate::components::MdxTag;
use crate::slug;

#[derive(Clone, Debug)]
pub struct MarkdownRenderOptions {
    /// Word-wrap prose to the render width. Code blocks are never wrapped.
    pub wrap_prose: bool,
    /// Base for relative link and image destinations, e.g. `https://example.com/posts/`.
    pub base_url: Option<String>,
    pub code: CodeRenderOptions,
}

impl Default for MarkdownRenderOptions {
    fn default() -> Self {
        Self {
            wrap_prose: true,
            base_url: None,
            code: CodeRenderOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct InlineFlags {
    emphasis: bool,
    strong: bool,
    strike: bool,
    kbd: bool,
}

/// A run of text and the component that draws it.
#[derive(Clone, Debug)]
struct Segment {
    text: String,
    tag: MdxTag,
    flags: InlineFlags,
    quoted: bool,
    href: Option<String>,
}

impl Segment {
    fn new(text: impl Into<String>, tag: MdxTag, flags: InlineFlags) -> Self {
        Self {
            text: text.into(),
            tag,
            flags,
            quoted: false,
            href: None,
        }
    }

    fn quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    fn with_href(mut self, href: Option<String>) -> Self {
        self.href = href;
        self
    }
}

#[derive(Clone, Debug)]
struct ProseBlock {
    lines: Vec<Vec<Segment>>,
    initial_prefix: Vec<Segment>,
    subsequent_prefix: Vec<Segment>,
}

#[derive(Clone, Debug)]
struct HeadingInfo {
    level: u8,
    slug: String,
}

#[derive(Clone, Debug)]
struct CodeBlock {
    language: Option<String>,
    code: String,
}

#[derive(Clone, Debug)]
struct TableBlock {
    aligns: Vec<Alignment>,
    head: Vec<Vec<Segment>>,
    body: Vec<Vec<Vec<Segment>>>,
}

#[derive(Clone, Debug)]
enum Block {
    Prose {
        prose: ProseBlock,
        /// Set for anchored headings (levels 1-4).
        heading: Option<HeadingInfo>,
    },
    Code(CodeBlock),
    Table(TableBlock),
    Image(ImageRequest),
    Rule,
    Spacer,
}

#[derive(Clone, Debug)]
struct Entry {
    block: Block,
    tag: MdxTag,
    /// Continuation prefix (quote bars, list indentation) for every line but the first.
    prefix: Vec<Segment>,
    /// Containers (lists, quotes) that start with this entry.
    opens: Vec<MdxTag>,
    /// Containers that end with this entry.
    closes: Vec<MdxTag>,
}

impl Entry {
    /// Blank lines wanted before and after the entry; adjacent margins collapse.
    fn margins(&self, ctx: RenderContext<'_>) -> (u16, u16) {
        let own = MdxComponents::style(self.tag, ctx);
        let top = self
            .opens
            .iter()
            .map(|tag| MdxComponents::style(*tag, ctx).margin_top)
            .fold(own.margin_top, u16::max);
        let bottom = self
            .closes
            .iter()
            .map(|tag| MdxComponents::style(*tag, ctx).margin_bottom)
            .fold(own.margin_bottom, u16::max);
        (top, bottom)
    }
}

/// A parsed post, ready to render at any width and color mode.
#[derive(Clone, Debug)]
pub struct MarkdownDocument {
    source: String,
    options: MarkdownRenderOptions,
    entries: Vec<Entry>,
}

impl MarkdownDocument {
    /// Parses `source`. Link and image destinations are resolved here, against
    /// `options.base_url`.
    pub fn parse(source: impl Into<String>, options: &MarkdownRenderOptions) -> Self {
        let source = source.into();
        let entries = parse_entries(&source, options.base_url.as_deref());
        tracing::debug!(blocks = entries.len(), "parsed markdown document");
        Self {
            source,
            options: options.clone(),
            entries,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the document for a terminal `width`.
    ///
    /// Code blocks go through `highlighter` (plain text when `None`); images are drawn inline by
    /// `images`. The result owns its text and is meant to be cached until the width, the color
    /// mode or the document changes.
    pub fn render(
        &self,
        width: u16,
        ctx: RenderContext<'_>,
        highlighter: Option<&dyn CodeHighlighter>,
        images: &dyn ImageRenderer,
    ) -> RenderedMarkdown {
        if width == 0 {
            return RenderedMarkdown::default();
        }
        let width = width as usize;

        let mut out: Vec<RenderedLine> = Vec::new();
        let mut anchors: Vec<HeadingAnchor> = Vec::new();
        let mut prev: Option<(u16, &Entry)> = None;
        for entry in &self.entries {
            let (top, bottom) = entry.margins(ctx);
            if let Some((prev_bottom, prev_entry)) = prev {
                let shared = shared_prefix(&prev_entry.prefix, &entry.prefix);
                for _ in 0..prev_bottom.max(top) {
                    out.push(line_from_segments(shared, &[], ctx));
                }
            }

            let start = out.len();
            match &entry.block {
                Block::Prose { prose, heading } => {
                    layout_prose(prose, width, self.options.wrap_prose, ctx, &mut out);
                    if let Some(info) = heading {
                        let anchor_span = out[start..]
                            .iter()
                            .enumerate()
                            .find_map(|(i, line)| line.anchor.map(|span| (start + i, span)));
                        anchors.push(HeadingAnchor {
                            slug: info.slug.clone(),
                            level: info.level,
                            line: start,
                            end_line: out.len().max(start + 1) - 1,
                            anchor_span,
                        });
                    }
                }
                Block::Code(code) => {
                    let rendered = render_code_block(
                        &code.code,
                        code.language.as_deref(),
                        highlighter,
                        ctx,
                        self.options.code,
                    );
                    for line in rendered.lines {
                        out.push(prefixed_line(&entry.prefix, line, ctx));
                    }
                }
                Block::Table(table) => out.extend(layout_table(table, &entry.prefix, width, ctx)),
                Block::Image(request) => {
                    let available = width.saturating_sub(segments_width(&entry.prefix)).max(1);
                    for line in images.inline_lines(request, available as u16, ctx) {
                        out.push(prefixed_line(&entry.prefix, line, ctx));
                    }
                }
                Block::Rule => {
                    let available = width.saturating_sub(segments_width(&entry.prefix)).max(1);
                    let rule = MdxTag::Hr.prefix().repeat(available);
                    out.push(line_from_segments(
                        &entry.prefix,
                        &[Segment::new(rule, MdxTag::Hr, InlineFlags::default())],
                        ctx,
                    ));
                }
                Block::Spacer => out.push(line_from_segments(&entry.prefix, &[], ctx)),
            }
            prev = Some((bottom, entry));
        }

        let mut links: Vec<LinkRegion> = Vec::new();
        for (line_idx, line) in out.iter().enumerate() {
            for (start, end, href) in &line.links {
                links.push(LinkRegion {
                    line: line_idx,
                    start: *start as u16,
                    end: *end as u16,
                    href: href.clone(),
                });
            }
        }

        let content_height = out.len() as u32;
        let content_width = out.iter().map(|l| l.width as u32).max().unwrap_or(0);
        let text = Text::from(
            out.into_iter()
                .map(|l| Line::from(l.spans).style(l.style))
                .collect::<Vec<_>>(),
        );

        RenderedMarkdown {
            text,
            anchors,
            links,
            revealed: None,
            content_width,
            content_height,
        }
    }
}

/// The in-page anchor of a level 1-4 heading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingAnchor {
    pub slug: String,
    pub level: u8,
    /// First rendered line of the heading.
    pub line: usize,
    /// Last rendered line of the heading (headings wrap).
    pub end_line: usize,
    anchor_span: Option<(usize, usize)>,
}

impl HeadingAnchor {
    pub fn href(&self) -> String {
        slug::href_for(&self.slug)
    }

    pub fn contains_line(&self, y: usize) -> bool {
        (self.line..=self.end_line).contains(&y)
    }
}

/// A clickable run of cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRegion {
    pub line: usize,
    /// First column.
    pub start: u16,
    /// One past the last column.
    pub end: u16,
    pub href: String,
}

#[derive(Clone, Debug, Default)]
pub struct RenderedMarkdown {
    text: Text<'static>,
    anchors: Vec<HeadingAnchor>,
    links: Vec<LinkRegion>,
    revealed: Option<usize>,
    content_width: u32,
    content_height: u32,
}

impl RenderedMarkdown {
    pub fn text(&self) -> &Text<'static> {
        &self.text
    }

    pub fn into_text(self) -> Text<'static> {
        self.text
    }

    /// Returns `(content_width, content_height)` in terminal cell units.
    pub fn content_size(&self) -> (u32, u32) {
        (self.content_width, self.content_height)
    }

    /// Anchored headings in document order.
    pub fn anchors(&self) -> &[HeadingAnchor] {
        &self.anchors
    }

    /// The first heading with `slug`; the target of a `#slug` link.
    pub fn anchor(&self, slug: &str) -> Option<&HeadingAnchor> {
        self.anchors.iter().find(|a| a.slug == slug)
    }

    /// The heading drawn on line `y`, if any.
    pub fn anchor_at_line(&self, y: usize) -> Option<&HeadingAnchor> {
        self.anchors.iter().find(|a| a.contains_line(y))
    }

    pub fn links(&self) -> &[LinkRegion] {
        &self.links
    }

    /// The destination of the link drawn at content cell `(x, y)`.
    ///
    /// Heading text and its `#` anchor link to the heading's own fragment.
    pub fn link_at(&self, x: u16, y: usize) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.line == y && (l.start..l.end).contains(&x))
            .map(|l| l.href.as_str())
    }

    /// Shows the `#` anchor of the heading with `slug` and hides any other.
    pub fn reveal_anchor(&mut self, slug: &str) -> bool {
        match self.anchors.iter().position(|a| a.slug == slug) {
            Some(idx) => {
                self.reveal_index(idx);
                true
            }
            None => {
                self.hide_anchors();
                false
            }
        }
    }

    /// Pointer hover over line `y`: reveals that heading's anchor, hides it when leaving.
    pub fn hover_line(&mut self, y: usize) -> bool {
        match self.anchors.iter().position(|a| a.contains_line(y)) {
            Some(idx) => {
                self.reveal_index(idx);
                true
            }
            None => {
                self.hide_anchors();
                false
            }
        }
    }

    pub fn revealed_anchor(&self) -> Option<&HeadingAnchor> {
        self.revealed.and_then(|idx| self.anchors.get(idx))
    }

    pub fn hide_anchors(&mut self) {
        if let Some(idx) = self.revealed.take() {
            self.set_anchor_hidden(idx, true);
        }
    }

    fn reveal_index(&mut self, idx: usize) {
        if self.revealed == Some(idx) {
            return;
        }
        self.hide_anchors();
        self.set_anchor_hidden(idx, false);
        self.revealed = Some(idx);
    }

    fn set_anchor_hidden(&mut self, idx: usize, hidden: bool) {
        let Some((line, span)) = self.anchors.get(idx).and_then(|a| a.anchor_span) else {
            return;
        };
        let Some(span) = self
            .text
            .lines
            .get_mut(line)
            .and_then(|l| l.spans.get_mut(span))
        else {
            return;
        };
        span.style = if hidden {
            span.style.add_modifier(Modifier::HIDDEN)
        } else {
            span.style.remove_modifier(Modifier::HIDDEN)
        };
    }
}

fn parse_entries(input: &str, base_url: Option<&str>) -> Vec<Entry> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(input, options);

    #[derive(Clone, Debug)]
    struct IndentCtx {
        initial: Vec<Segment>,
        subsequent: Vec<Segment>,
        use_subsequent_for_initial: bool,
    }

    #[derive(Clone, Debug)]
    struct ListCtx {
        ordered: bool,
        index: u64,
    }

    #[derive(Clone, Debug)]
    struct HeadingState {
        level: u8,
        text: String,
    }

    #[derive(Clone, Debug)]
    struct ImageState {
        dest: String,
        alt: String,
    }

    struct Builder<'a> {
        base_url: Option<&'a str>,
        entries: Vec<Entry>,
        pending_opens: Vec<MdxTag>,
        indent_stack: Vec<IndentCtx>,
        list_stack: Vec<ListCtx>,
        /// Indent stack index of each open list item.
        item_stack: Vec<usize>,
        blockquote_depth: usize,
        inline: InlineFlags,
        link_href: Option<String>,
        in_paragraph: bool,
        text_tag: MdxTag,
        para_lines: Vec<Vec<Segment>>,
        para_current: Vec<Segment>,
        para_prefix_initial: Vec<Segment>,
        para_prefix_subsequent: Vec<Segment>,
        heading: Option<HeadingState>,
        heading_count: usize,
        in_code_block: bool,
        code_language: Option<String>,
        code_text: String,
        in_table: bool,
        in_table_head: bool,
        in_table_cell: bool,
        table_aligns: Vec<Alignment>,
        table_row: Vec<Vec<Segment>>,
        table_cell: Vec<Segment>,
        table_head: Vec<Vec<Segment>>,
        table_body: Vec<Vec<Vec<Segment>>>,
        table_prefix: Vec<Segment>,
        image: Option<ImageState>,
    }

    impl<'a> Builder<'a> {
        fn new(base_url: Option<&'a str>) -> Self {
            Self {
                base_url,
                entries: Vec::new(),
                pending_opens: Vec::new(),
                indent_stack: Vec::new(),
                list_stack: Vec::new(),
                item_stack: Vec::new(),
                blockquote_depth: 0,
                inline: InlineFlags::default(),
                link_href: None,
                in_paragraph: false,
                text_tag: MdxTag::P,
                para_lines: Vec::new(),
                para_current: Vec::new(),
                para_prefix_initial: Vec::new(),
                para_prefix_subsequent: Vec::new(),
                heading: None,
                heading_count: 0,
                in_code_block: false,
                code_language: None,
                code_text: String::new(),
                in_table: false,
                in_table_head: false,
                in_table_cell: false,
                table_aligns: Vec::new(),
                table_row: Vec::new(),
                table_cell: Vec::new(),
                table_head: Vec::new(),
                table_body: Vec::new(),
                table_prefix: Vec::new(),
                image: None,
            }
        }

        fn quoted(&self) -> bool {
            self.blockquote_depth > 0
        }

        fn default_text_tag(&self) -> MdxTag {
            if self.item_stack.is_empty() {
                MdxTag::P
            } else {
                MdxTag::Li
            }
        }

        /// A text run at the current position: link text, or the enclosing block's text.
        fn text_segment(&self, text: impl Into<String>) -> Segment {
            let tag = if self.link_href.is_some() {
                MdxTag::A
            } else {
                self.text_tag
            };
            Segment::new(text, tag, self.inline)
                .quoted(self.quoted())
                .with_href(self.link_href.clone())
        }

        fn push_entry(&mut self, block: Block, tag: MdxTag, prefix: Vec<Segment>) {
            let opens = mem::take(&mut self.pending_opens);
            self.entries.push(Entry {
                block,
                tag,
                prefix,
                opens,
                closes: Vec::new(),
            });
            self.mark_item_has_block();
        }

        /// Ends a container on the last entry, or drops it if nothing was placed inside.
        fn close_container(&mut self, tag: MdxTag) {
            if self.pending_opens.last() == Some(&tag) {
                self.pending_opens.pop();
            } else if let Some(entry) = self.entries.last_mut() {
                entry.closes.push(tag);
            }
        }

        fn mark_item_has_block(&mut self) {
            if let Some(idx) = self.item_stack.last()
                && let Some(ctx) = self.indent_stack.get_mut(*idx)
            {
                ctx.use_subsequent_for_initial = true;
            }
        }

        fn snapshot_prefixes(&self) -> (Vec<Segment>, Vec<Segment>) {
            let mut initial: Vec<Segment> = Vec::new();
            let mut subsequent: Vec<Segment> = Vec::new();
            for ctx in &self.indent_stack {
                if ctx.use_subsequent_for_initial {
                    initial.extend(ctx.subsequent.clone());
                } else {
                    initial.extend(ctx.initial.clone());
                }
                subsequent.extend(ctx.subsequent.clone());
            }
            (initial, subsequent)
        }

        fn start_paragraph(&mut self, tag: MdxTag) {
            self.flush_para();
            self.in_paragraph = true;
            self.text_tag = tag;
            let (initial, subsequent) = self.snapshot_prefixes();
            self.para_prefix_initial = initial;
            self.para_prefix_subsequent = subsequent;
        }

        fn ensure_paragraph(&mut self) {
            if !self.in_paragraph {
                self.start_paragraph(self.default_text_tag());
            }
        }

        fn flush_para(&mut self) {
            self.finish_para(None);
        }

        fn finish_para(&mut self, heading: Option<HeadingInfo>) {
            if !self.in_paragraph {
                return;
            }
            self.in_paragraph = false;
            if !self.para_current.is_empty() {
                self.para_lines.push(mem::take(&mut self.para_current));
            }
            let lines = mem::take(&mut self.para_lines);
            let has_text = lines.iter().flatten().any(|s| !s.text.trim().is_empty());
            if !has_text && heading.is_none() {
                return;
            }
            let prose = ProseBlock {
                lines,
                initial_prefix: mem::take(&mut self.para_prefix_initial),
                subsequent_prefix: self.para_prefix_subsequent.clone(),
            };
            let prefix = mem::take(&mut self.para_prefix_subsequent);
            self.push_entry(Block::Prose { prose, heading }, self.text_tag, prefix);
        }

        fn finish_heading(&mut self) {
            let Some(state) = self.heading.take() else {
                self.flush_para();
                return;
            };
            if state.level > 4 {
                self.flush_para();
                return;
            }
            let slug = slug::heading_id(&state.text, self.heading_count);
            let href = slug::href_for(&slug);
            // The whole heading links to its own fragment.
            for seg in self.para_lines.iter_mut().flatten().chain(self.para_current.iter_mut()) {
                if seg.href.is_none() {
                    seg.href = Some(href.clone());
                }
            }
            let quoted = self.quoted();
            self.para_current.push(
                Segment::new(MdxTag::HeadingAnchor.prefix(), self.text_tag, InlineFlags::default())
                    .quoted(quoted)
                    .with_href(Some(href.clone())),
            );
            self.para_current.push(
                Segment::new("#", MdxTag::HeadingAnchor, InlineFlags::default())
                    .quoted(quoted)
                    .with_href(Some(href)),
            );
            self.finish_para(Some(HeadingInfo {
                level: state.level,
                slug,
            }));
        }

        fn finish_image(&mut self) {
            let Some(image) = self.image.take() else {
                return;
            };
            let alt = image.alt.trim().to_string();
            if self.heading.is_some() || self.in_table_cell {
                let label = if alt.is_empty() { "image".to_string() } else { alt };
                let mut seg = self.text_segment(label);
                seg.flags.emphasis = true;
                push_inline(self, seg);
                return;
            }
            // Images break out of their paragraph and are drawn as a block.
            self.flush_para();
            let (_, prefix) = self.snapshot_prefixes();
            self.push_entry(
                Block::Image(ImageRequest::new(image.dest, alt)),
                MdxTag::Img,
                prefix,
            );
        }

        fn flush_code(&mut self) {
            if !self.in_code_block {
                return;
            }
            self.in_code_block = false;
            let (_, prefix) = self.snapshot_prefixes();
            let block = CodeBlock {
                language: self.code_language.take(),
                code: mem::take(&mut self.code_text),
            };
            self.push_entry(Block::Code(block), MdxTag::Pre, prefix);
        }

        fn flush_table(&mut self) {
            if !self.in_table {
                return;
            }
            self.flush_para();
            self.in_table = false;
            self.in_table_head = false;
            self.in_table_cell = false;
            let table = TableBlock {
                aligns: mem::take(&mut self.table_aligns),
                head: mem::take(&mut self.table_head),
                body: mem::take(&mut self.table_body),
            };
            let prefix = mem::take(&mut self.table_prefix);
            self.push_entry(Block::Table(table), MdxTag::Table, prefix);
        }

        fn task_marker(&mut self, checked: bool) {
            let Some(ctx) = self.indent_stack.last_mut() else {
                return;
            };
            if ctx.initial.is_empty() || ctx.subsequent.is_empty() {
                return;
            }
            let marker = if checked { "[✓] " } else { "[ ] " }.to_string();
            let marker_width = UnicodeWidthStr::width(marker.as_str());
            ctx.initial[0].text = marker.clone();
            ctx.subsequent[0].text = " ".repeat(marker_width);
            // The paragraph already snapshotted its prefix.
            if let Some(first) = self
                .para_prefix_initial
                .iter_mut()
                .rev()
                .find(|s| s.tag == MdxTag::Ul || s.tag == MdxTag::Ol)
            {
                first.text = marker;
            }
        }
    }

    fn push_inline(b: &mut Builder, seg: Segment) {
        if b.in_table && b.in_table_cell {
            b.table_cell.push(seg);
        } else {
            b.ensure_paragraph();
            b.para_current.push(seg);
        }
    }

    fn line_break(b: &mut Builder) {
        if b.in_table && b.in_table_cell {
            let seg = b.text_segment(" ");
            b.table_cell.push(seg);
        } else if b.in_paragraph {
            b.para_lines.push(mem::take(&mut b.para_current));
        }
    }

    let mut b = Builder::new(base_url);

    for ev in parser {
        match ev {
            Event::Start(tag) => match tag {
                Tag::Paragraph => {
                    let tag = b.default_text_tag();
                    b.start_paragraph(tag);
                }
                Tag::Heading { level, .. } => {
                    let level = heading_level(level);
                    b.heading_count += 1;
                    b.heading = Some(HeadingState {
                        level,
                        text: String::new(),
                    });
                    b.start_paragraph(MdxTag::heading(level));
                }
                Tag::BlockQuote(_) => {
                    b.flush_para();
                    b.blockquote_depth += 1;
                    b.pending_opens.push(MdxTag::Blockquote);
                    let bar = Segment::new(
                        MdxTag::Blockquote.prefix(),
                        MdxTag::Blockquote,
                        InlineFlags::default(),
                    )
                    .quoted(true);
                    b.indent_stack.push(IndentCtx {
                        initial: vec![bar.clone()],
                        subsequent: vec![bar],
                        use_subsequent_for_initial: false,
                    });
                }
                Tag::List(start) => {
                    b.flush_para();
                    let ordered = start.is_some();
                    if b.list_stack.is_empty() {
                        b.pending_opens
                            .push(if ordered { MdxTag::Ol } else { MdxTag::Ul });
                    }
                    b.list_stack.push(ListCtx {
                        ordered,
                        index: start.unwrap_or(1),
                    });
                }
                Tag::Item => {
                    b.flush_para();
                    let Some(list) = b.list_stack.last() else {
                        continue;
                    };
                    let (marker, tag) = if list.ordered {
                        (format!("{}. ", list.index), MdxTag::Ol)
                    } else {
                        (MdxTag::Ul.prefix().to_string(), MdxTag::Ul)
                    };
                    let marker_width = UnicodeWidthStr::width(marker.as_str());
                    let quoted = b.quoted();
                    b.item_stack.push(b.indent_stack.len());
                    b.indent_stack.push(IndentCtx {
                        initial: vec![Segment::new(marker, tag, InlineFlags::default()).quoted(quoted)],
                        subsequent: vec![
                            Segment::new(" ".repeat(marker_width), tag, InlineFlags::default())
                                .quoted(quoted),
                        ],
                        use_subsequent_for_initial: false,
                    });
                }
                Tag::Emphasis => b.inline.emphasis = true,
                Tag::Strong => b.inline.strong = true,
                Tag::Strikethrough => b.inline.strike = true,
                Tag::Link { dest_url, .. } => {
                    b.link_href = Some(resolve_url(b.base_url, dest_url.as_ref()));
                }
                Tag::Image { dest_url, .. } => {
                    b.image = Some(ImageState {
                        dest: resolve_url(b.base_url, dest_url.as_ref()),
                        alt: String::new(),
                    });
                }
                Tag::CodeBlock(kind) => {
                    b.flush_para();
                    b.in_code_block = true;
                    b.code_text.clear();
                    b.code_language = match kind {
                        CodeBlockKind::Fenced(lang) => normalize_fenced_lang(&lang),
                        CodeBlockKind::Indented => None,
                    };
                }
                Tag::Table(aligns) => {
                    b.flush_para();
                    b.in_table = true;
                    let (_, subsequent) = b.snapshot_prefixes();
                    b.table_prefix = subsequent;
                    b.table_aligns = aligns;
                    b.table_head.clear();
                    b.table_body.clear();
                    b.table_row.clear();
                }
                Tag::TableHead => {
                    b.in_table_head = true;
                    b.table_row.clear();
                }
                Tag::TableRow => b.table_row.clear(),
                Tag::TableCell => {
                    b.in_table_cell = true;
                    b.table_cell.clear();
                    b.text_tag = if b.in_table_head { MdxTag::Th } else { MdxTag::Td };
                }
                Tag::HtmlBlock => b.flush_para(),
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph | TagEnd::HtmlBlock => b.flush_para(),
                TagEnd::Heading(_) => b.finish_heading(),
                TagEnd::BlockQuote(_) => {
                    b.flush_para();
                    b.indent_stack.pop();
                    b.blockquote_depth = b.blockquote_depth.saturating_sub(1);
                    b.close_container(MdxTag::Blockquote);
                }
                TagEnd::List(ordered) => {
                    b.flush_para();
                    b.list_stack.pop();
                    if b.list_stack.is_empty() {
                        b.close_container(if ordered { MdxTag::Ol } else { MdxTag::Ul });
                    }
                }
                TagEnd::Item => {
                    b.flush_para();
                    if let Some(list) = b.list_stack.last_mut() {
                        list.index += 1;
                    }
                    b.item_stack.pop();
                    b.indent_stack.pop();
                }
                TagEnd::Emphasis => b.inline.emphasis = false,
                TagEnd::Strong => b.inline.strong = false,
                TagEnd::Strikethrough => b.inline.strike = false,
                TagEnd::Link => b.link_href = None,
                TagEnd::Image => b.finish_image(),
                TagEnd::CodeBlock => b.flush_code(),
                TagEnd::TableCell => {
                    b.in_table_cell = false;
                    let cell = mem::take(&mut b.table_cell);
                    b.table_row.push(cell);
                }
                TagEnd::TableHead => {
                    b.in_table_head = false;
                    b.table_head = mem::take(&mut b.table_row);
                }
                TagEnd::TableRow => {
                    let row = mem::take(&mut b.table_row);
                    b.table_body.push(row);
                }
                TagEnd::Table => b.flush_table(),
                _ => {}
            },
            Event::Text(text) => {
                if b.in_code_block {
                    for ch in text.chars() {
                        match ch {
                            '\r' => {}
                            '\t' => b.code_text.push_str("    "),
                            other => b.code_text.push(other),
                        }
                    }
                    continue;
                }
                if let Some(image) = b.image.as_mut() {
                    image.alt.push_str(text.as_ref());
                    continue;
                }
                if let Some(heading) = b.heading.as_mut() {
                    heading.text.push_str(text.as_ref());
                }
                let seg = b.text_segment(text.to_string());
                push_inline(&mut b, seg);
            }
            Event::Code(code) => {
                if let Some(image) = b.image.as_mut() {
                    image.alt.push_str(code.as_ref());
                    continue;
                }
                if let Some(heading) = b.heading.as_mut() {
                    heading.text.push_str(code.as_ref());
                }
                let mut seg = b.text_segment(code.to_string());
                seg.tag = MdxTag::InlineCode;
                push_inline(&mut b, seg);
            }
            Event::SoftBreak => {
                if let Some(image) = b.image.as_mut() {
                    image.alt.push(' ');
                    continue;
                }
                if let Some(heading) = b.heading.as_mut() {
                    heading.text.push(' ');
                }
                if b.in_paragraph || b.in_table_cell {
                    let seg = b.text_segment(" ");
                    push_inline(&mut b, seg);
                }
            }
            Event::HardBreak => line_break(&mut b),
            Event::Rule => {
                b.flush_para();
                let (_, prefix) = b.snapshot_prefixes();
                b.push_entry(Block::Rule, MdxTag::Hr, prefix);
            }
            Event::Html(html) => {
                if is_br(&html) {
                    b.flush_para();
                    let (_, prefix) = b.snapshot_prefixes();
                    b.push_entry(Block::Spacer, MdxTag::Br, prefix);
                    continue;
                }
                let text = html_to_text(&html);
                if !text.is_empty() {
                    let seg = b.text_segment(text);
                    push_inline(&mut b, seg);
                }
            }
            Event::InlineHtml(html) => {
                let tag = html.trim().to_ascii_lowercase();
                match tag.as_str() {
                    "<kbd>" => b.inline.kbd = true,
                    "</kbd>" => b.inline.kbd = false,
                    _ if is_br(&tag) => line_break(&mut b),
                    _ => {
                        let text = html_to_text(&html);
                        if !text.is_empty() {
                            let seg = b.text_segment(text);
                            push_inline(&mut b, seg);
                        }
                    }
                }
            }
            Event::TaskListMarker(checked) => b.task_marker(checked),
            _ => {}
        }
    }

    b.flush_para();
    b.flush_code();
    b.flush_table();
    b.entries
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// First word of a fence info string, without `language-` or `{}` wrappers.
fn normalize_fenced_lang(lang: &CowStr<'_>) -> Option<String> {
    let first = lang.split_whitespace().next().unwrap_or("");
    let first = first.split(',').next().unwrap_or("").trim();
    let first = first.strip_prefix("language-").unwrap_or(first);
    let first = first.strip_prefix('{').unwrap_or(first);
    let first = first.strip_suffix('}').unwrap_or(first).trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

fn is_br(html: &str) -> bool {
    let tag: String = html
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(tag.as_str(), "<br>" | "<br/>")
}

fn html_to_text(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            _ => out.push(ch),
        }
    }
    normalize_whitespace(&decode_basic_html_entities(&out))
}

fn decode_basic_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link or image destination against `base_url`.
///
/// Fragments and destinations with a scheme are kept as written. Anything that cannot be
/// resolved falls back to the raw destination.
fn resolve_url(base_url: Option<&str>, dest: &str) -> String {
    let dest = dest.trim();
    if dest.is_empty() || is_absolute_url(dest) {
        return dest.to_string();
    }
    let Some(base) = base_url.map(str::trim).filter(|s| !s.is_empty()) else {
        return dest.to_string();
    };

    match Url::parse(base) {
        Ok(base) => base.join(dest).map(|u| u.to_string()).unwrap_or_else(|err| {
            tracing::debug!(%err, dest, "could not resolve link, keeping it as written");
            dest.to_string()
        }),
        Err(_) => {
            let base = base.trim_end_matches('/');
            let dest = dest.trim_start_matches("./").trim_start_matches('/');
            format!("{base}/{dest}")
        }
    }
}

fn is_absolute_url(dest: &str) -> bool {
    dest.starts_with('#') || Url::parse(dest).is_ok()
}

#[derive(Clone, Debug, Default)]
struct RenderedLine {
    spans: Vec<Span<'static>>,
    style: Style,
    width: usize,
    /// Index of the heading anchor span.
    anchor: Option<usize>,
    /// `(start, end, href)` column ranges.
    links: Vec<(usize, usize, String)>,
}

impl RenderedLine {
    fn push_segment(&mut self, seg: &Segment, ctx: RenderContext<'_>) {
        if seg.text.is_empty() {
            return;
        }
        let w = text_width(&seg.text);
        if seg.tag == MdxTag::HeadingAnchor {
            self.anchor = Some(self.spans.len());
        }
        if let Some(href) = &seg.href {
            let continues = matches!(
                self.links.last(),
                Some((_, end, last)) if *end == self.width && last == href
            );
            if continues && let Some(link) = self.links.last_mut() {
                link.1 += w;
            } else {
                self.links.push((self.width, self.width + w, href.clone()));
            }
        }
        self.spans
            .push(Span::styled(seg.text.clone(), segment_style(seg, ctx)));
        self.width += w;
    }

    fn push_span(&mut self, span: Span<'static>) {
        self.width += text_width(span.content.as_ref());
        self.spans.push(span);
    }
}

fn line_from_segments(prefix: &[Segment], segs: &[Segment], ctx: RenderContext<'_>) -> RenderedLine {
    let mut line = RenderedLine::default();
    for seg in prefix.iter().chain(segs) {
        line.push_segment(seg, ctx);
    }
    if prefix.iter().chain(segs).any(|s| s.quoted)
        && let Some(bg) = MdxComponents::style(MdxTag::Blockquote, ctx).style.bg
    {
        line.style = Style::default().bg(bg);
    }
    line
}

/// A pre-styled line (code, image) behind a container prefix.
fn prefixed_line(prefix: &[Segment], line: Line<'static>, ctx: RenderContext<'_>) -> RenderedLine {
    let mut out = line_from_segments(prefix, &[], ctx);
    out.style = out.style.patch(line.style);
    for span in line.spans {
        out.push_span(span);
    }
    out
}

fn segment_style(seg: &Segment, ctx: RenderContext<'_>) -> Style {
    let mut style = MdxComponents::style(seg.tag, ctx).style;
    if seg.quoted
        && style.bg.is_none()
        && let Some(bg) = MdxComponents::style(MdxTag::Blockquote, ctx).style.bg
    {
        style = style.bg(bg);
    }
    if seg.flags.kbd {
        style = style.patch(MdxComponents::style(MdxTag::Kbd, ctx).style);
    }
    if seg.flags.strong {
        style = style.patch(MdxComponents::style(MdxTag::Strong, ctx).style);
    }
    if seg.flags.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if seg.flags.strike {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    style
}

fn layout_prose(
    prose: &ProseBlock,
    width: usize,
    wrap: bool,
    ctx: RenderContext<'_>,
    out: &mut Vec<RenderedLine>,
) {
    for (i, logical) in prose.lines.iter().enumerate() {
        let initial_prefix = if i == 0 {
            &prose.initial_prefix
        } else {
            &prose.subsequent_prefix
        };
        if wrap {
            out.extend(wrap_segments(
                initial_prefix,
                &prose.subsequent_prefix,
                logical,
                width,
                ctx,
            ));
        } else {
            out.push(line_from_segments(initial_prefix, logical, ctx));
        }
    }
}

fn wrap_segments(
    initial_prefix: &[Segment],
    subsequent_prefix: &[Segment],
    segments: &[Segment],
    width: usize,
    ctx: RenderContext<'_>,
) -> Vec<RenderedLine> {
    let tokens: Vec<Segment> = segments.iter().flat_map(split_segment_ws).collect();

    let mut out: Vec<RenderedLine> = Vec::new();
    let mut cur: Vec<Segment> = Vec::new();
    let mut prefix = initial_prefix;
    let mut cur_cols = segments_width(prefix);

    for tok in tokens {
        let tok_cols = text_width(&tok.text);
        if cur.is_empty() && is_all_ws(&tok.text) {
            continue;
        }
        if cur_cols + tok_cols <= width {
            cur.push(tok);
            cur_cols += tok_cols;
            continue;
        }

        if !cur.is_empty() {
            out.push(line_from_segments(prefix, &cur, ctx));
            cur.clear();
            prefix = subsequent_prefix;
            cur_cols = segments_width(prefix);
            if is_all_ws(&tok.text) {
                continue;
            }
        }

        // Hard-split words wider than the line.
        let mut remaining = tok;
        loop {
            let remaining_cols = text_width(&remaining.text);
            if cur_cols + remaining_cols <= width {
                cur_cols += remaining_cols;
                cur.push(remaining);
                break;
            }
            let max = width.saturating_sub(cur_cols).max(1);
            let (head, tail) = split_to_width_prefer_url_breaks(&remaining, max);
            cur.push(head);
            out.push(line_from_segments(prefix, &cur, ctx));
            cur.clear();
            prefix = subsequent_prefix;
            cur_cols = segments_width(prefix);
            remaining = tail;
            if remaining.text.is_empty() || is_all_ws(&remaining.text) {
                break;
            }
        }
    }

    if !cur.is_empty() || out.is_empty() {
        out.push(line_from_segments(prefix, &cur, ctx));
    }
    out
}

fn split_to_width_prefer_url_breaks(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    if looks_like_url(&seg.text)
        && let Some(split_idx) = last_url_breakpoint_before(&seg.text, max_cols)
    {
        return split_at(seg, split_idx);
    }
    split_to_width(seg, max_cols)
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

fn last_url_breakpoint_before(s: &str, max_cols: usize) -> Option<usize> {
    let mut cols = 0usize;
    let mut best: Option<usize> = None;
    for (byte_idx, ch) in s.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        cols += w;
        if matches!(ch, '.' | '-' | '_' | '~' | '?' | '&' | '#' | '=' | '/') {
            best = Some(byte_idx + ch.len_utf8());
        }
    }
    best
}

fn split_segment_ws(seg: &Segment) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut buf = String::new();
    let mut last_was_ws: Option<bool> = None;
    for ch in seg.text.chars() {
        let is_ws = ch.is_whitespace();
        if last_was_ws.is_some_and(|prev| prev != is_ws) {
            let mut s = seg.clone();
            s.text = mem::take(&mut buf);
            out.push(s);
        }
        buf.push(ch);
        last_was_ws = Some(is_ws);
    }
    if !buf.is_empty() {
        let mut s = seg.clone();
        s.text = buf;
        out.push(s);
    }
    out
}

/// Splits off the longest head that fits `max_cols`. The head holds at least one character, so
/// a wide glyph on a one-column line still makes progress.
fn split_to_width(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    let mut cols = 0usize;
    let mut idx = 0usize;
    for (byte_idx, ch) in seg.text.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            if idx == 0 {
                idx = byte_idx + ch.len_utf8();
            }
            break;
        }
        cols += w;
        idx = byte_idx + ch.len_utf8();
    }
    split_at(seg, idx)
}

fn split_at(seg: &Segment, idx: usize) -> (Segment, Segment) {
    let (a, b) = seg.text.split_at(idx);
    let mut left = seg.clone();
    left.text = a.to_string();
    let mut right = seg.clone();
    right.text = b.to_string();
    (left, right)
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

fn text_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn segments_width(segs: &[Segment]) -> usize {
    segs.iter().map(|s| text_width(&s.text)).sum()
}

/// The leading prefix segments two entries have in common, e.g. the quote bar of a blank line
/// between two quoted paragraphs.
fn shared_prefix<'a>(a: &[Segment], b: &'a [Segment]) -> &'a [Segment] {
    let n = a
        .iter()
        .zip(b)
        .take_while(|(x, y)| x.text == y.text && x.tag == y.tag)
        .count();
    &b[..n]
}

fn layout_table(
    table: &TableBlock,
    prefix: &[Segment],
    width: usize,
    ctx: RenderContext<'_>,
) -> Vec<RenderedLine> {
    let cols = std::iter::once(&table.head)
        .chain(&table.body)
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    let available = width.saturating_sub(segments_width(prefix));
    // " a │ b ": one space each side of every cell plus the separators.
    let chrome = (3 * cols).saturating_sub(1);
    if cols == 0 || available <= chrome {
        tracing::debug!(cols, width, "table does not fit, skipping");
        return Vec::new();
    }

    let mut col_w = vec![1usize; cols];
    for row in std::iter::once(&table.head).chain(&table.body) {
        for (ci, cell) in row.iter().enumerate() {
            col_w[ci] = col_w[ci].max(segments_width(cell));
        }
    }
    let budget = available - chrome;
    let mut total: usize = col_w.iter().sum();
    while total > budget {
        let Some((idx, _)) = col_w
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 1)
            .max_by_key(|(_, w)| **w)
        else {
            break;
        };
        col_w[idx] -= 1;
        total -= 1;
    }

    let mut out: Vec<RenderedLine> = Vec::new();
    if !table.head.is_empty() {
        out.push(layout_table_row(&table.head, &col_w, &table.aligns, MdxTag::Th, prefix, ctx));
    }
    for row in &table.body {
        if !out.is_empty() {
            out.push(table_border_line(&col_w, prefix, ctx));
        }
        out.push(layout_table_row(row, &col_w, &table.aligns, MdxTag::Td, prefix, ctx));
    }
    out
}

fn table_border_line(col_w: &[usize], prefix: &[Segment], ctx: RenderContext<'_>) -> RenderedLine {
    let mut border = String::new();
    for (i, w) in col_w.iter().enumerate() {
        if i > 0 {
            border.push('┼');
        }
        border.push_str(&"─".repeat(w + 2));
    }
    line_from_segments(
        prefix,
        &[Segment::new(border, MdxTag::Hr, InlineFlags::default())],
        ctx,
    )
}

fn layout_table_row(
    cells: &[Vec<Segment>],
    col_w: &[usize],
    aligns: &[Alignment],
    tag: MdxTag,
    prefix: &[Segment],
    ctx: RenderContext<'_>,
) -> RenderedLine {
    let pad = |n: usize| Segment::new(" ".repeat(n), tag, InlineFlags::default());
    let mut segs: Vec<Segment> = Vec::new();
    for (ci, w) in col_w.iter().copied().enumerate() {
        if ci > 0 {
            segs.push(Segment::new("│", MdxTag::Hr, InlineFlags::default()));
        }
        let cell = cells.get(ci).map(Vec::as_slice).unwrap_or(&[]);
        let fitted = fit_segments(cell, w);
        let slack = w.saturating_sub(segments_width(&fitted));
        let (left, right) = match aligns.get(ci).copied().unwrap_or(Alignment::None) {
            Alignment::Center => (slack / 2, slack - slack / 2),
            Alignment::Right => (slack, 0),
            Alignment::Left | Alignment::None => (0, slack),
        };
        segs.push(pad(left + 1));
        segs.extend(fitted);
        segs.push(pad(right + 1));
    }
    line_from_segments(prefix, &segs, ctx)
}

/// Truncates a cell to `max_cols`, ending with `…` when something was cut.
fn fit_segments(segs: &[Segment], max_cols: usize) -> Vec<Segment> {
    if segments_width(segs) <= max_cols {
        return segs.to_vec();
    }
    let budget = max_cols.saturating_sub(1);
    let mut out: Vec<Segment> = Vec::new();
    let mut used = 0usize;
    for seg in segs {
        let w = text_width(&seg.text);
        if used + w <= budget {
            out.push(seg.clone());
            used += w;
            continue;
        }
        if budget > used {
            let (head, _) = split_to_width(seg, budget - used);
            if used + text_width(&head.text) <= budget {
                out.push(head);
            }
        }
        break;
    }
    if let Some(last) = out.last().or(segs.first()) {
        let mut ellipsis = last.clone();
        ellipsis.text = "…".to_string();
        out.push(ellipsis);
    }
    out
}

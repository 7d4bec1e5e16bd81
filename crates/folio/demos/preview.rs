use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use folio::book::BookShelf;
use folio::book::CardAction;
use folio::book::load_books;
use folio::crossterm_input::mouse_event_from_crossterm;
use folio::image::AltTextImages;
use folio::input::MouseButton;
use folio::input::MouseEvent;
use folio::input::MouseEventKind;
use folio::markdown::MarkdownDocument;
use folio::markdown::MarkdownRenderOptions;
use folio::markdown::RenderedMarkdown;
use folio::syntax::syntect::SyntectHighlighter;
use folio::theme::ColorMode;
use folio::theme::RenderContext;
use folio::theme::ThemeConfig;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use std::io;
use std::time::Duration;

const SAMPLE_POST: &str = r#"
# Building a terminal blog

This post renders through the **same component table** as the site. Press `t` to toggle the
color mode, hover a heading to reveal its anchor, click a [link](notes/terminal.html) to follow it.

## Code

```python
def greet(name):
    return f"hello {name}"
```

```shell
cargo run -p folio --example preview --all-features
```

## Quotes and lists

> Color mode changes styles, never structure.

- Headings get stable ids, e.g. [back to code](#code)
- Press <kbd>q</kbd> to quit

| Component | Tag |
|-----------|-----|
| Heading   | h1-h4 |
| Table     | table |

---

![A screenshot](images/preview.png)
"#;

const SAMPLE_BOOKS: &str = r#"
[[book]]
title = "Designing Data-Intensive Applications"
author = "Martin Kleppmann"
cover = "/images/books/ddia.jpg"
state = "reading"
link = "https://dataintensive.net"

[[book]]
title = "The Rust Programming Language"
author = "Steve Klabnik & Carol Nichols"
cover = "/images/books/trpl.jpg"
state = "finished"
link = "https://doc.rust-lang.org/book/"

[[book]]
title = "Broken record"
author = "Nobody"
state = "wishlist"
link = "not a url"
"#;

struct App {
    theme: ThemeConfig,
    mode: ColorMode,
    doc: MarkdownDocument,
    highlighter: SyntectHighlighter,
    rendered: Option<(u16, ColorMode, RenderedMarkdown)>,
    books: Vec<folio::book::Book>,
    scroll: usize,
    post_area: Rect,
    shelf_area: Rect,
    status: String,
}

impl App {
    fn ctx(&self) -> RenderContext<'_> {
        RenderContext::new(&self.theme, self.mode)
    }

    /// Re-renders only when the width or the color mode changed.
    fn ensure_rendered(&mut self, width: u16) {
        if matches!(&self.rendered, Some((w, m, _)) if *w == width && *m == self.mode) {
            return;
        }
        let rendered = self.doc.render(
            width,
            self.ctx(),
            Some(&self.highlighter),
            &AltTextImages,
        );
        self.rendered = Some((width, self.mode, rendered));
    }

    fn rendered_mut(&mut self) -> Option<&mut RenderedMarkdown> {
        self.rendered.as_mut().map(|(_, _, r)| r)
    }

    fn content_pos(&self, ev: &MouseEvent) -> Option<(u16, usize)> {
        let area = self.post_area;
        if !area.contains((ev.x, ev.y).into()) {
            return None;
        }
        Some((ev.x - area.x, self.scroll + (ev.y - area.y) as usize))
    }

    fn handle_mouse(&mut self, ev: MouseEvent) {
        if let Some((x, y)) = self.content_pos(&ev) {
            match ev.kind {
                MouseEventKind::Moved => {
                    if let Some(rendered) = self.rendered_mut() {
                        rendered.hover_line(y);
                    }
                }
                MouseEventKind::Down(MouseButton::Left) => self.follow_link(x, y),
                _ => {}
            }
            return;
        }
        if let Some(rendered) = self.rendered_mut() {
            rendered.hide_anchors();
        }
        let shelf = BookShelf::new(&self.books);
        if let Some(CardAction::OpenExternal(link)) = shelf.handle_mouse_event(self.shelf_area, ev) {
            self.status = format!("open {link}");
        }
    }

    fn follow_link(&mut self, x: u16, y: usize) {
        let Some((_, _, rendered)) = &self.rendered else {
            return;
        };
        let Some(href) = rendered.link_at(x, y) else {
            return;
        };
        if let Some(slug) = href.strip_prefix('#') {
            if let Some(anchor) = rendered.anchor(slug) {
                self.scroll = anchor.line;
                self.status = format!("jumped to {href}");
            }
        } else {
            self.status = format!("open {href}");
        }
    }
}

fn main() -> io::Result<()> {
    if init_logging().is_some() {
        tracing::info!("logging to folio-preview.log");
    }

    let theme = ThemeConfig::default();
    let mode = theme.color_mode.resolve_from_env();
    let options = MarkdownRenderOptions {
        base_url: Some("https://example.com/blog/".to_string()),
        ..MarkdownRenderOptions::default()
    };
    let books = load_books(SAMPLE_BOOKS).map_err(io::Error::other)?;

    let mut app = App {
        theme,
        mode,
        doc: MarkdownDocument::parse(SAMPLE_POST.trim(), &options),
        highlighter: SyntectHighlighter::new(),
        rendered: None,
        books,
        scroll: 0,
        post_area: Rect::default(),
        shelf_area: Rect::default(),
        status: String::new(),
    };

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let res = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    res
}

/// Logs to `folio-preview.log` when `RUST_LOG` is set; the terminal belongs to the UI.
fn init_logging() -> Option<()> {
    std::env::var_os("RUST_LOG")?;
    let file = std::fs::File::create("folio-preview.log").ok()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok()
}

fn run<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if !crossterm::event::poll(Duration::from_millis(50))? {
            continue;
        }
        match crossterm::event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('t') => {
                    app.mode = app.mode.toggle();
                    app.status = format!("{:?} mode", app.mode);
                    tracing::info!(mode = ?app.mode, "toggled color mode");
                }
                KeyCode::Char('j') | KeyCode::Down => app.scroll = app.scroll.saturating_add(1),
                KeyCode::Char('k') | KeyCode::Up => app.scroll = app.scroll.saturating_sub(1),
                KeyCode::Char('g') => app.scroll = 0,
                _ => {}
            },
            Event::Mouse(m) => {
                if let Some(ev) = mouse_event_from_crossterm(m) {
                    app.handle_mouse(ev);
                }
            }
            _ => {}
        }
    }
}

fn ui(f: &mut ratatui::Frame<'_>, app: &mut App) {
    let [top, status] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .areas(f.area());
    let [left, right] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .areas(top);

    let left_block = Block::default().title("Post".cyan()).borders(Borders::ALL);
    let right_block = Block::default().title("Reading list".cyan()).borders(Borders::ALL);
    app.post_area = left_block.inner(left);
    app.shelf_area = right_block.inner(right);
    f.render_widget(left_block, left);
    f.render_widget(right_block, right);

    app.ensure_rendered(app.post_area.width);
    let page_bg = Style::default().bg(app.ctx().mode(
        folio::palette::WHITE,
        folio::palette::DARK_SURFACE,
    ));
    if let Some((_, _, rendered)) = &app.rendered {
        let max_scroll = rendered.content_size().1.saturating_sub(1) as usize;
        app.scroll = app.scroll.min(max_scroll);
        let paragraph = Paragraph::new(rendered.text().clone())
            .style(page_bg)
            .scroll((app.scroll.min(u16::MAX as usize) as u16, 0));
        f.render_widget(paragraph, app.post_area);
    }

    let ctx = app.ctx();
    BookShelf::new(&app.books).render(app.shelf_area, f.buffer_mut(), ctx, &AltTextImages);

    let help = format!(
        " q quit · t toggle mode ({:?}) · j/k scroll · {}",
        app.mode, app.status
    );
    f.render_widget(Paragraph::new(help).style(Style::default().dark_gray()), status);
}

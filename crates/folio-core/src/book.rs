//! Book cards for the reading list.
//!
//! A [`BookCard`] draws a cover, a status tag overlaid on the cover's top-right corner, the title
//! and the author. The whole card is a single link: a click anywhere inside its bounds opens
//! [`Book::link`] and nothing inside competes with it.
//!
//! Book records come from static content, typically a TOML file:
//!
//! ```toml
//! [[book]]
//! title = "Designing Data-Intensive Applications"
//! author = "Martin Kleppmann"
//! cover = "/images/books/ddia.jpg"
//! state = "reading"
//! link = "https://dataintensive.net"
//! ```
use std::str::FromStr;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::error::Result;
use crate::image::ImageRenderer;
use crate::image::ImageRequest;
use crate::image::ObjectFit;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::palette;
use crate::render;
use crate::theme::RenderContext;

pub const COVER_WIDTH_PX: u16 = 55;
pub const COVER_HEIGHT_PX: u16 = 83;

const PADDING_X: u16 = 2;
const PADDING_Y: u16 = 1;
const COVER_COLS: u16 = 8;
const COVER_ROWS: u16 = 6;
const TEXT_SPACING: u16 = 3;
const TAG_COLS: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BookState {
    Reading,
    Finished,
    Wishlist,
}

impl BookState {
    pub const ALL: [BookState; 3] = [BookState::Reading, BookState::Finished, BookState::Wishlist];

    pub fn label(self) -> &'static str {
        match self {
            BookState::Reading => "reading",
            BookState::Finished => "finished",
            BookState::Wishlist => "wishlist",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            BookState::Reading => "◐",
            BookState::Finished => "✓",
            BookState::Wishlist => "★",
        }
    }

    pub fn tag_style(self, ctx: RenderContext<'_>) -> Style {
        let (subtle, strong, text) = match self {
            BookState::Reading => (palette::BLUE_100, palette::BLUE_200, palette::BLUE_800),
            BookState::Finished => (palette::GREEN_100, palette::GREEN_200, palette::GREEN_800),
            BookState::Wishlist => (palette::PURPLE_100, palette::PURPLE_200, palette::PURPLE_800),
        };
        Style::default().bg(ctx.mode(subtle, strong)).fg(text)
    }
}

impl FromStr for BookState {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::MissingField("state"));
        }
        BookState::ALL
            .into_iter()
            .find(|state| state.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| Error::UnknownState(value.to_string()))
    }
}

/// A reading-list record. Every field defaults to empty so one bad record never fails the whole
/// shelf; [`Book::validate`] decides whether its card can be drawn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// One of `reading`, `finished` or `wishlist`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub link: String,
}

impl Book {
    /// Checks the fields a card cannot do without: a title, a known state and an absolute link.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::MissingField("title"));
        }
        self.state()?;
        let link = self.link.trim();
        if link.is_empty() {
            return Err(Error::MissingField("link"));
        }
        Url::parse(link).map_err(|source| Error::InvalidLink {
            link: self.link.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn state(&self) -> Result<BookState> {
        self.state.parse()
    }

    pub fn cover_request(&self) -> ImageRequest {
        ImageRequest::new(self.cover.clone(), format!("{} cover", self.title))
            .with_size(COVER_WIDTH_PX, COVER_HEIGHT_PX)
            .with_fit(ObjectFit::Cover)
    }
}

/// Parses a list of `[[book]]` tables.
pub fn load_books(source: &str) -> Result<Vec<Book>> {
    #[derive(Deserialize)]
    struct Shelf {
        #[serde(default)]
        book: Vec<Book>,
    }

    let shelf: Shelf = toml::from_str(source)?;
    tracing::debug!(count = shelf.book.len(), "loaded books");
    Ok(shelf.book)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardAction<'a> {
    /// Open the link outside the app (browser).
    OpenExternal(&'a str),
}

#[derive(Clone, Copy, Debug)]
pub struct BookCard<'a> {
    book: &'a Book,
}

impl<'a> BookCard<'a> {
    /// Rows a card needs: the cover plus vertical padding.
    pub const HEIGHT: u16 = COVER_ROWS + 2 * PADDING_Y;

    pub fn new(book: &'a Book) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &'a Book {
        self.book
    }

    pub fn cover_area(&self, area: Rect) -> Rect {
        let (cols, rows) = self
            .book
            .cover_request()
            .cell_size()
            .unwrap_or((COVER_COLS, COVER_ROWS));
        Rect::new(
            area.x.saturating_add(PADDING_X),
            area.y.saturating_add(PADDING_Y),
            cols,
            rows,
        )
        .intersection(area)
    }

    /// The status tag: on the cover's top row, overhanging its right edge by one column.
    pub fn tag_area(&self, area: Rect) -> Rect {
        let cover = self.cover_area(area);
        let x = (cover.right() + 1).saturating_sub(TAG_COLS).max(area.x);
        Rect::new(x, cover.y, TAG_COLS, 1).intersection(area)
    }

    /// The card's link if `(x, y)` is inside the card. Invalid cards have no link.
    pub fn link_at(&self, area: Rect, x: u16, y: u16) -> Option<&'a str> {
        if !area.contains((x, y).into()) || self.book.validate().is_err() {
            return None;
        }
        Some(self.book.link.trim())
    }

    pub fn handle_mouse_event(&self, area: Rect, event: MouseEvent) -> Option<CardAction<'a>> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self
                .link_at(area, event.x, event.y)
                .map(CardAction::OpenExternal),
            _ => None,
        }
    }

    pub fn render(
        &self,
        area: Rect,
        buf: &mut Buffer,
        ctx: RenderContext<'_>,
        images: &dyn ImageRenderer,
    ) {
        if area.is_empty() {
            return;
        }
        if let Err(err) = self.book.validate() {
            tracing::warn!(title = %self.book.title, error = %err, "book card not rendered");
            let notice = Style::default().fg(ctx.mode(palette::ORANGE_500, palette::ORANGE_200));
            render::render_spans_clipped(
                area.x,
                area.y,
                area.width,
                buf,
                &[Span::styled(format!("⚠ book card: {err}"), notice)],
                Style::default(),
            );
            return;
        }

        let surface = Style::default().bg(ctx.mode(palette::GRAY_50, palette::GRAY_700));
        render::fill(area, buf, surface);

        let cover = self.cover_area(area);
        if !cover.is_empty() {
            images.render(&self.book.cover_request(), cover, buf, ctx);
        }

        let tag = self.tag_area(area);
        if !tag.is_empty()
            && let Ok(state) = self.book.state()
        {
            render::render_spans_clipped(
                tag.x,
                tag.y,
                tag.width,
                buf,
                &[Span::styled(format!(" {} ", state.glyph()), state.tag_style(ctx))],
                surface,
            );
        }

        let text_x = cover.right().saturating_add(TEXT_SPACING);
        let text_w = area
            .right()
            .saturating_sub(PADDING_X)
            .saturating_sub(text_x);
        if text_w == 0 {
            return;
        }
        let title_y = cover.y + (cover.height / 2).saturating_sub(1);
        if title_y >= area.bottom() {
            return;
        }
        let title = render::truncate_with_ellipsis(&self.book.title, text_w as usize);
        render::render_spans_clipped(
            text_x,
            title_y,
            text_w,
            buf,
            &[Span::styled(title, ctx.heading_style())],
            surface,
        );

        let author_y = title_y + 1;
        if author_y < area.bottom() {
            let author = render::truncate_with_ellipsis(&self.book.author, text_w as usize);
            let muted = Style::default().fg(ctx.mode(palette::GRAY_600, palette::GRAY_400));
            render::render_spans_clipped(
                text_x,
                author_y,
                text_w,
                buf,
                &[Span::styled(author, muted)],
                surface,
            );
        }
    }
}

/// A vertical stack of book cards separated by one blank row.
#[derive(Clone, Copy, Debug)]
pub struct BookShelf<'a> {
    books: &'a [Book],
}

impl<'a> BookShelf<'a> {
    pub fn new(books: &'a [Book]) -> Self {
        Self { books }
    }

    /// Card areas inside `area`, in book order. Cards that would not fit are omitted.
    pub fn layout(&self, area: Rect) -> Vec<Rect> {
        let mut out = Vec::with_capacity(self.books.len());
        let mut y = area.y;
        for _ in self.books {
            if y.saturating_add(BookCard::HEIGHT) > area.bottom() {
                break;
            }
            out.push(Rect::new(area.x, y, area.width, BookCard::HEIGHT));
            y = y.saturating_add(BookCard::HEIGHT + 1);
        }
        out
    }

    pub fn render(
        &self,
        area: Rect,
        buf: &mut Buffer,
        ctx: RenderContext<'_>,
        images: &dyn ImageRenderer,
    ) {
        for (book, card_area) in self.books.iter().zip(self.layout(area)) {
            BookCard::new(book).render(card_area, buf, ctx, images);
        }
    }

    pub fn handle_mouse_event(&self, area: Rect, event: MouseEvent) -> Option<CardAction<'a>> {
        self.books
            .iter()
            .zip(self.layout(area))
            .find_map(|(book, card_area)| BookCard::new(book).handle_mouse_event(card_area, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    use crate::image::AltTextImages;
    use crate::theme::ColorMode;
    use crate::theme::ThemeConfig;

    fn book(state: BookState) -> Book {
        Book {
            cover: "/images/books/sicp.jpg".to_string(),
            title: "Structure and Interpretation".to_string(),
            author: "Abelson & Sussman".to_string(),
            state: state.label().to_string(),
            link: "https://mitpress.mit.edu/sicp".to_string(),
        }
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (buf.area.left()..buf.area.right())
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn validates_required_fields() {
        assert!(book(BookState::Reading).validate().is_ok());

        let mut missing_title = book(BookState::Reading);
        missing_title.title = "  ".to_string();
        assert!(matches!(
            missing_title.validate(),
            Err(Error::MissingField("title"))
        ));

        let mut missing_link = book(BookState::Reading);
        missing_link.link.clear();
        assert!(matches!(
            missing_link.validate(),
            Err(Error::MissingField("link"))
        ));

        let mut relative = book(BookState::Reading);
        relative.link = "books/sicp".to_string();
        assert!(matches!(relative.validate(), Err(Error::InvalidLink { .. })));

        let mut no_state = book(BookState::Reading);
        no_state.state.clear();
        assert!(matches!(no_state.validate(), Err(Error::MissingField("state"))));

        let mut lost = book(BookState::Reading);
        lost.state = "lost".to_string();
        assert!(matches!(lost.validate(), Err(Error::UnknownState(s)) if s == "lost"));
    }

    #[test]
    fn parses_state_labels() {
        for state in BookState::ALL {
            assert_eq!(state.label().parse::<BookState>().ok(), Some(state));
        }
        assert_eq!(" Wishlist ".parse::<BookState>().ok(), Some(BookState::Wishlist));
    }

    #[test]
    fn tag_sits_on_cover_top_right_corner() {
        let b = book(BookState::Wishlist);
        let card = BookCard::new(&b);
        let area = Rect::new(0, 0, 40, BookCard::HEIGHT);
        let cover = card.cover_area(area);
        let tag = card.tag_area(area);
        assert_eq!(cover, Rect::new(2, 1, 8, 6));
        assert_eq!(tag.y, cover.y);
        assert_eq!(tag.right(), cover.right() + 1);
        assert!(tag.x > cover.x && tag.x < cover.right());
    }

    #[test]
    fn renders_cover_tag_title_and_author() {
        let theme = ThemeConfig::default();
        let ctx = RenderContext::new(&theme, ColorMode::Light);
        let b = book(BookState::Wishlist);
        let area = Rect::new(0, 0, 48, BookCard::HEIGHT);
        let mut buf = Buffer::empty(area);
        BookCard::new(&b).render(area, &mut buf, ctx, &AltTextImages);

        assert!(row(&buf, 1).contains(" ★ "));
        assert!(row(&buf, 3).contains("Structure and Interpretation"));
        assert!(row(&buf, 4).contains("Abelson & Sussman"));
        assert_eq!(buf[(0, 0)].bg, palette::GRAY_50);
        assert_eq!(buf[(9, 1)].bg, palette::PURPLE_100);
    }

    #[test]
    fn whole_card_is_one_link() {
        let b = book(BookState::Finished);
        let card = BookCard::new(&b);
        let area = Rect::new(4, 2, 30, BookCard::HEIGHT);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                assert_eq!(
                    card.handle_mouse_event(area, MouseEvent::left_click(x, y)),
                    Some(CardAction::OpenExternal("https://mitpress.mit.edu/sicp"))
                );
            }
        }
        assert_eq!(card.handle_mouse_event(area, MouseEvent::left_click(3, 2)), None);
        assert_eq!(
            card.handle_mouse_event(area, MouseEvent::left_click(4, area.bottom())),
            None
        );
        assert_eq!(
            card.handle_mouse_event(area, MouseEvent::new(5, 3, MouseEventKind::Moved)),
            None
        );
    }

    #[test]
    fn invalid_card_renders_notice_and_no_link() {
        let theme = ThemeConfig::default();
        let ctx = RenderContext::new(&theme, ColorMode::Dark);
        let mut b = book(BookState::Reading);
        b.title.clear();
        let area = Rect::new(0, 0, 60, BookCard::HEIGHT);
        let mut buf = Buffer::empty(area);
        let card = BookCard::new(&b);
        card.render(area, &mut buf, ctx, &AltTextImages);
        assert!(row(&buf, 0).contains("missing required field `title`"));
        assert_eq!(card.link_at(area, 1, 1), None);
    }

    #[test]
    fn short_area_stays_inside_its_bounds() {
        let theme = ThemeConfig::default();
        let ctx = RenderContext::new(&theme, ColorMode::Light);
        let b = book(BookState::Wishlist);
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 3));
        BookCard::new(&b).render(Rect::new(0, 0, 40, 1), &mut buf, ctx, &AltTextImages);

        assert_eq!(buf[(0, 0)].bg, palette::GRAY_50);
        for y in 1..3 {
            assert_eq!(row(&buf, y), " ".repeat(40));
            assert_eq!(buf[(9, y)].bg, Color::Reset);
        }
    }

    #[test]
    fn color_mode_changes_surface_only() {
        let theme = ThemeConfig::default();
        let b = book(BookState::Reading);
        let area = Rect::new(0, 0, 48, BookCard::HEIGHT);
        let mut light = Buffer::empty(area);
        let mut dark = Buffer::empty(area);
        let ctx = RenderContext::new(&theme, ColorMode::Light);
        BookCard::new(&b).render(area, &mut light, ctx, &AltTextImages);
        BookCard::new(&b).render(area, &mut dark, ctx.with_color_mode(ColorMode::Dark), &AltTextImages);
        for y in 0..BookCard::HEIGHT {
            assert_eq!(row(&light, y), row(&dark, y));
        }
        assert_eq!(dark[(0, 0)].bg, palette::GRAY_700);
    }

    #[test]
    fn loads_books_from_toml() {
        let books = load_books(
            r#"
            [[book]]
            title = "Crafting Interpreters"
            author = "Robert Nystrom"
            cover = "/images/books/ci.jpg"
            state = "finished"
            link = "https://craftinginterpreters.com"

            [[book]]
            title = "Untitled draft"
            state = "wishlist"

            [[book]]
            title = "No state"
            link = "https://example.com/no-state"

            [[book]]
            title = "Lost"
            state = "lost"
            link = "https://example.com/lost"
            "#,
        )
        .expect("valid shelf");
        assert_eq!(books.len(), 4);
        assert_eq!(books[0].state().ok(), Some(BookState::Finished));
        assert!(books[0].validate().is_ok());
        assert!(matches!(books[1].validate(), Err(Error::MissingField("link"))));
        assert!(matches!(books[2].validate(), Err(Error::MissingField("state"))));
        assert!(matches!(books[3].validate(), Err(Error::UnknownState(_))));

        assert!(matches!(load_books("[[book]]\ntitle = 3\n"), Err(Error::Config(_))));
    }

    #[test]
    fn stateless_record_renders_notice_only_on_its_card() {
        let theme = ThemeConfig::default();
        let ctx = RenderContext::new(&theme, ColorMode::Light);
        let mut broken = book(BookState::Reading);
        broken.state.clear();
        let books = vec![book(BookState::Finished), broken];
        let area = Rect::new(0, 0, 60, 2 * BookCard::HEIGHT + 1);
        let mut buf = Buffer::empty(area);
        BookShelf::new(&books).render(area, &mut buf, ctx, &AltTextImages);

        assert!(row(&buf, 3).contains("Structure and Interpretation"));
        assert!(row(&buf, BookCard::HEIGHT + 1).contains("missing required field `state`"));
    }

    #[test]
    fn shelf_routes_clicks_to_the_right_card() {
        let mut second = book(BookState::Reading);
        second.link = "https://example.com/second".to_string();
        let books = vec![book(BookState::Finished), second];
        let shelf = BookShelf::new(&books);
        let area = Rect::new(0, 0, 40, 20);
        let cards = shelf.layout(area);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].y, BookCard::HEIGHT + 1);
        assert_eq!(
            shelf.handle_mouse_event(area, MouseEvent::left_click(1, cards[1].y)),
            Some(CardAction::OpenExternal("https://example.com/second"))
        );
        assert_eq!(
            shelf.handle_mouse_event(area, MouseEvent::left_click(1, BookCard::HEIGHT)),
            None
        );
    }
}

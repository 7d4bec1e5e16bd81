//! Blog content components for `ratatui`.
//!
//! `folio` re-exports [`folio_core`] and, behind features, the rich-text and highlighting
//! crates:
//!
//! - `markdown`: [`markdown`] posts rendered through the component table.
//! - `syntect`: [`syntax`] highlighting for code blocks.
//! - `crossterm`: [`crossterm_input`] event conversions.
//!
//! ```rust
//! use folio::code_render::{CodeRenderOptions, render_code_block};
//! use folio::theme::{ColorMode, RenderContext, ThemeConfig};
//!
//! let theme = ThemeConfig::default();
//! let ctx = RenderContext::new(&theme, ColorMode::Dark);
//! let code = render_code_block("a\nb\n", Some("python"), None, ctx, CodeRenderOptions::default());
//! assert_eq!(code.content_height, 2);
//! ```
pub use folio_core::book;
pub use folio_core::code_render;
pub use folio_core::error;
pub use folio_core::image;
pub use folio_core::input;
pub use folio_core::palette;
pub use folio_core::render;
pub use folio_core::text;
pub use folio_core::theme;

#[cfg(feature = "crossterm")]
pub use folio_core::crossterm_input;

#[cfg(feature = "markdown")]
pub use folio_markdown as markdown;

#[cfg(feature = "syntect")]
pub use folio_syntax as syntax;

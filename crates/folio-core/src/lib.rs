//! `folio-core` provides the building blocks for rendering blog content in terminal UIs.
//!
//! Heavier functionality (markdown parsing, syntax highlighting backends) lives in separate
//! crates; most users should depend on the facade crate `folio`.
//!
//! ## Design goals
//!
//! - Pure rendering: every component is a function of its input record and a
//!   [`theme::RenderContext`] (theme + color mode). Nothing reads a global theme.
//! - Color mode changes styles, never structure: switching light/dark yields the same lines,
//!   spans and cells with different colors.
//! - Broken content stays local: a malformed record renders a short notice instead of its
//!   component, and the rest of the page renders normally.
//!
//! Useful entry points:
//! - [`code_render::render_code_block`]: highlighted, numbered code blocks.
//! - [`book::BookCard`] / [`book::BookShelf`]: reading-list cards.
//! - [`theme::ThemeConfig`]: site theme and color-mode policy.
pub mod error;
pub mod palette;
pub mod theme;

pub mod text;

pub mod input;
#[cfg(feature = "crossterm")]
pub mod crossterm_input;
pub mod render;

pub mod code_render;
pub mod image;

pub mod book;

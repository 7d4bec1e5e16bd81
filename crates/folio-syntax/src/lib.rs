//! Syntax highlighting backends for `folio` code blocks.
//!
//! Backends implement [`folio_core::text::CodeHighlighter`] and emit color-free
//! [`folio_core::text::Token`]s; colors are applied per color mode by the code renderer.
//!
//! - `syntect` (feature: `syntect`): TextMate grammars, scopes classified by [`scope`].
//!
//! The facade crate `folio` re-exports this crate behind its `syntect` feature.
pub mod scope;

#[cfg(feature = "syntect")]
pub mod syntect;

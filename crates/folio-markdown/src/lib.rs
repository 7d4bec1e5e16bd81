//! Rich-text rendering for `folio` posts.
//!
//! Markdown is parsed once into color-free blocks and rendered to `ratatui` text per width and
//! color mode. Every element is drawn by the component registered for its tag in
//! [`components::MdxComponents`].
//!
//! - [`document::MarkdownDocument`]: parse and render a post.
//! - [`document::RenderedMarkdown`]: rendered lines plus heading anchors and link regions.
//! - [`slug`]: heading ids.
pub mod components;
pub mod document;
pub mod slug;

pub use components::MdxComponents;
pub use components::MdxTag;
pub use document::MarkdownDocument;
pub use document::MarkdownRenderOptions;
pub use document::RenderedMarkdown;

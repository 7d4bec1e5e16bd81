//! Heading slugs for in-document anchors.

/// Generates a URL-safe slug from heading text.
///
/// Lowercases, turns runs of whitespace, `-` and `_` into a single `-`, drops other
/// punctuation and trims hyphens from both ends. Unicode letters and digits are kept.
///
/// ```
/// use folio_markdown::slug::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
/// assert_eq!(slugify(&slugify("Über Rust_2024")), "über-rust-2024");
/// ```
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }
    out
}

/// The anchor id of the `position`-th heading (1-based) with plain text `text`.
///
/// Headings without any sluggable text (an image-only heading, say) get `heading-<position>`.
pub fn heading_id(text: &str, position: usize) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        tracing::debug!(position, "heading has no sluggable text, using positional id");
        format!("heading-{position}")
    } else {
        slug
    }
}

pub fn href_for(slug: &str) -> String {
    format!("#{slug}")
}

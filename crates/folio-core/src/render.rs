use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Paints every cell of `area` with `style`, clearing its symbol.
pub fn fill(area: Rect, buf: &mut Buffer, style: Style) {
    let area = area.intersection(buf.area);
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(" ");
                cell.set_style(style);
            }
        }
    }
}

/// Draws spans starting at `(x, y)`, stopping before `max_cols` display columns.
///
/// Styles are patched onto `base`, so spans without a background inherit the surface's.
/// Returns the number of columns drawn.
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'_>],
    base: Style,
) -> u16 {
    let max_cols = max_cols as usize;
    let mut out_cols = 0usize;
    let mut tmp = [0u8; 4];

    for span in spans {
        let style = base.patch(span.style);
        for ch in span.content.chars() {
            let ch = if ch == '\t' { ' ' } else { ch };
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if w == 0 {
                continue;
            }
            if out_cols + w > max_cols {
                return out_cols as u16;
            }

            let s = ch.encode_utf8(&mut tmp);
            let cx = x.saturating_add(out_cols as u16);
            if let Some(cell) = buf.cell_mut((cx, y)) {
                cell.set_style(style);
                cell.set_symbol(s);
            }
            out_cols += 1;

            if w == 2 {
                if let Some(cell) = buf.cell_mut((cx.saturating_add(1), y)) {
                    cell.set_style(style);
                    cell.set_symbol("");
                }
                out_cols += 1;
            }
        }
    }
    out_cols as u16
}

/// Truncates `input` to `max_cols` display columns, ending with `…` when shortened.
pub fn truncate_with_ellipsis(input: &str, max_cols: usize) -> String {
    if UnicodeWidthStr::width(input) <= max_cols {
        return input.to_string();
    }
    if max_cols == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut cols = 0usize;
    for ch in input.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w + 1 > max_cols {
            break;
        }
        out.push(ch);
        cols += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn clips_at_max_cols() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 1));
        let drawn = render_spans_clipped(
            0,
            0,
            4,
            &mut buf,
            &[Span::raw("abc"), Span::styled("def", Style::default().fg(Color::Red))],
            Style::default(),
        );
        assert_eq!(drawn, 4);
        assert_eq!(buf[(3, 0)].symbol(), "d");
        assert_eq!(buf[(3, 0)].fg, Color::Red);
        assert_eq!(buf[(4, 0)].symbol(), " ");
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("The Rust Programming Language", 8), "The Rus…");
        assert_eq!(truncate_with_ellipsis("abc", 0), "");
    }
}

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

use crate::viewport::ViewportState;

const TAB_WIDTH: usize = 4;

/// Draws a one-column scrollbar for `state` into `area`.
pub fn render_scrollbar(area: Rect, buf: &mut Buffer, state: &ViewportState, style: Style) {
    buf.set_style(area, style);
    if area.height == 0 {
        return;
    }
    if state.content_h <= state.viewport_h as u32 || state.content_h == 0 {
        for dy in 0..area.height {
            buf.set_stringn(area.x, area.y + dy, " ", 1, style);
        }
        return;
    }

    let track_h = area.height as f64;
    let thumb_h = ((state.viewport_h as f64 / state.content_h as f64) * track_h)
        .round()
        .clamp(1.0, track_h) as u16;
    let max_y = state
        .content_h
        .saturating_sub(state.viewport_h as u32)
        .max(1) as f64;
    let thumb_top = ((state.y as f64 / max_y) * (track_h - thumb_h as f64))
        .round()
        .clamp(0.0, (track_h - thumb_h as f64).max(0.0)) as u16;

    for dy in 0..area.height {
        let ch = if dy >= thumb_top && dy < thumb_top + thumb_h {
            "█"
        } else {
            " "
        };
        buf.set_stringn(area.x, area.y + dy, ch, 1, style);
    }
}

pub fn render_str_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    input: &str,
    style: Style,
) {
    let span = Span::styled(input.to_string(), style);
    render_spans_clipped(x, y, start_col, max_cols, buf, &[span], style);
}

/// Draws `spans` on row `y`, skipping the first `start_col` display columns and never writing
/// past `max_cols`. Wide characters that straddle either edge are dropped rather than split.
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'_>],
    fallback_style: Style,
) {
    if max_cols == 0 {
        return;
    }
    let mut cursor = ClipCursor {
        x,
        y,
        start_col: start_col as usize,
        max_cols: max_cols as usize,
        col: 0,
        written: 0,
    };

    for span in spans {
        let style = if span.style == Style::default() {
            fallback_style
        } else {
            fallback_style.patch(span.style)
        };
        for ch in span.content.chars() {
            let keep_going = if ch == '\t' {
                (0..TAB_WIDTH).all(|_| cursor.put(buf, ' ', 1, style))
            } else {
                match UnicodeWidthChar::width(ch) {
                    Some(0) | None => true,
                    Some(w) => cursor.put(buf, ch, w, style),
                }
            };
            if !keep_going {
                return;
            }
        }
    }
}

struct ClipCursor {
    x: u16,
    y: u16,
    start_col: usize,
    max_cols: usize,
    col: usize,
    written: usize,
}

impl ClipCursor {
    /// Returns `false` once the row is full.
    fn put(&mut self, buf: &mut Buffer, ch: char, width: usize, style: Style) -> bool {
        if self.col < self.start_col {
            self.col += width;
            return true;
        }
        if self.written + width > self.max_cols {
            return false;
        }
        let mut tmp = [0u8; 4];
        let dx = self.x + self.written as u16;
        if let Some(cell) = buf.cell_mut((dx, self.y)) {
            cell.set_style(style);
            cell.set_symbol(ch.encode_utf8(&mut tmp));
        }
        for pad in 1..width {
            if let Some(cell) = buf.cell_mut((dx + pad as u16, self.y)) {
                cell.set_style(style);
                cell.set_symbol("");
            }
        }
        self.col += width;
        self.written += width;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn clips_to_max_cols_and_start_col() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 5, 1));
        render_str_clipped(0, 0, 2, 3, &mut buf, "abcdef", Style::default());
        assert_eq!(row(&buf, 0), "cde  ");
    }

    #[test]
    fn expands_tabs() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 1));
        render_str_clipped(0, 0, 0, 6, &mut buf, "\tx", Style::default());
        assert_eq!(row(&buf, 0), "    x ");
    }

    #[test]
    fn drops_wide_char_that_does_not_fit() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 3, 1));
        render_str_clipped(0, 0, 0, 3, &mut buf, "你好", Style::default());
        assert_eq!(buf[(0, 0)].symbol(), "你");
        assert_eq!(buf[(2, 0)].symbol(), " ");
    }
}

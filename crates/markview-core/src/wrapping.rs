use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// Lines are kept whole and the pane scrolls horizontally.
    None,
    #[default]
    Word,
}

/// Display width of a styled line.
pub fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
        .sum()
}

/// Wraps `line` to at most `width` display columns, preferring to break after whitespace.
///
/// Styles are preserved per character; a word longer than `width` is split hard. A zero width
/// returns the line unchanged.
pub fn wrap_line(line: &Line<'static>, width: u16, mode: WrapMode) -> Vec<Line<'static>> {
    let width = width as usize;
    if mode == WrapMode::None || width == 0 || line_width(line) <= width {
        return vec![line.clone()];
    }

    let cells: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|s| s.content.chars().map(move |c| (c, s.style)))
        .collect();

    let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
    let mut current: Vec<(char, Style)> = Vec::new();
    let mut current_w = 0usize;
    let mut last_space: Option<usize> = None;

    for cell in cells {
        let w = UnicodeWidthChar::width(cell.0).unwrap_or(0);
        if current_w + w > width && !current.is_empty() {
            match last_space {
                Some(idx) if idx + 1 < current.len() => {
                    let tail = current.split_off(idx + 1);
                    rows.push(std::mem::take(&mut current));
                    current = tail;
                }
                _ => rows.push(std::mem::take(&mut current)),
            }
            current_w = current
                .iter()
                .map(|(c, _)| UnicodeWidthChar::width(*c).unwrap_or(0))
                .sum();
            last_space = None;
        }
        if cell.0 == ' ' {
            last_space = Some(current.len());
        }
        current.push(cell);
        current_w += w;
    }
    if !current.is_empty() {
        rows.push(current);
    }

    rows.into_iter()
        .map(|row| Line::from(collapse_cells(row)).style(line.style))
        .collect()
}

fn collapse_cells(cells: Vec<(char, Style)>) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut style: Option<Style> = None;
    for (ch, s) in cells {
        if style.is_some_and(|cur| cur != s) {
            spans.push(Span::styled(std::mem::take(&mut text), style.unwrap_or_default()));
        }
        style = Some(s);
        text.push(ch);
    }
    if !text.is_empty() {
        spans.push(Span::styled(text, style.unwrap_or_default()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Stylize;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn short_line_is_untouched() {
        let line = Line::from("hello");
        assert_eq!(plain(&wrap_line(&line, 10, WrapMode::Word)), vec!["hello"]);
    }

    #[test]
    fn breaks_after_whitespace() {
        let line = Line::from("alpha beta gamma");
        assert_eq!(
            plain(&wrap_line(&line, 11, WrapMode::Word)),
            vec!["alpha beta ", "gamma"]
        );
    }

    #[test]
    fn long_word_is_split_hard() {
        let line = Line::from("abcdefgh");
        assert_eq!(
            plain(&wrap_line(&line, 3, WrapMode::Word)),
            vec!["abc", "def", "gh"]
        );
    }

    #[test]
    fn keeps_span_styles_across_rows() {
        let line = Line::from(vec![Span::raw("aa "), "bbbb".bold()]);
        let rows = wrap_line(&line, 4, WrapMode::Word);
        assert_eq!(plain(&rows), vec!["aa ", "bbbb"]);
        assert_eq!(rows[1].spans[0].style, Style::default().bold());
    }

    #[test]
    fn none_mode_never_wraps() {
        let line = Line::from("alpha beta gamma");
        assert_eq!(wrap_line(&line, 4, WrapMode::None).len(), 1);
    }
}

use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::render;
use crate::viewport::ViewportState;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Debug)]
pub struct EditorOptions {
    pub show_scrollbar: bool,
    pub style: Style,
    /// Spaces inserted for `Tab`.
    pub tab_size: usize,
    pub placeholder: String,
    pub placeholder_style: Style,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            show_scrollbar: true,
            style: Style::default(),
            tab_size: 4,
            placeholder: String::new(),
            placeholder_style: Style::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize, // char index within line
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorAction {
    None,
    /// The buffer text changed; the caller reads it back with [`EditorArea::text`].
    Changed,
}

/// Multi-line plain-text editor backing the editable pane.
///
/// The editor never talks to a document. Callers replace its value with [`EditorArea::set_text`]
/// and observe user edits through [`EditorAction::Changed`].
#[derive(Clone, Debug)]
pub struct EditorArea {
    lines: Vec<String>,
    cursor: Cursor,
    preferred_x: Option<usize>, // display columns
    pub state: ViewportState,
    options: EditorOptions,
}

impl Default for EditorArea {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorArea {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::default(),
            preferred_x: None,
            state: ViewportState::default(),
            options,
        }
    }

    /// Replaces the whole buffer. The cursor is kept at the same row/column where the new text
    /// still has one, so a refresh with near-identical text does not jump.
    pub fn set_text(&mut self, text: &str) {
        let text = normalize_newlines(text);
        self.lines = text.split('\n').map(str::to_string).collect();
        self.cursor.row = self.cursor.row.min(self.lines.len() - 1);
        self.cursor.col = self.cursor.col.min(self.current_line_char_len());
        self.preferred_x = None;
        self.recompute_content_size();
        self.state.clamp();
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let content = self.content_area(area);
        if content.width == 0 || content.height == 0 {
            return None;
        }
        let (cx, cy) = self.cursor_screen_pos();
        let x = cx.checked_sub(self.state.x)?;
        let y = cy.checked_sub(self.state.y)?;
        if x >= content.width as u32 || y >= content.height as u32 {
            return None;
        }
        Some((content.x + x as u16, content.y + y as u16))
    }

    pub fn input(&mut self, event: InputEvent) -> EditorAction {
        match event {
            InputEvent::Paste(s) => {
                self.insert_str(&s);
                self.after_edit()
            }
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Mouse(_) | InputEvent::Resize(..) => EditorAction::None,
        }
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let content = self.content_area(area);
        self.state.set_viewport(content.width, content.height);
        self.recompute_content_size();
        self.ensure_cursor_visible();

        if self.is_empty() && !self.options.placeholder.is_empty() {
            buf.set_style(content, self.options.style);
            render::render_str_clipped(
                content.x,
                content.y,
                0,
                content.width,
                buf,
                &self.options.placeholder,
                self.options.placeholder_style,
            );
        } else {
            for row in 0..content.height {
                let y = content.y + row;
                buf.set_style(Rect::new(content.x, y, content.width, 1), self.options.style);
                let idx = (self.state.y as usize).saturating_add(row as usize);
                if let Some(line) = self.lines.get(idx) {
                    render::render_str_clipped(
                        content.x,
                        y,
                        self.state.x,
                        content.width,
                        buf,
                        line,
                        self.options.style,
                    );
                }
            }
        }

        if content.width < area.width {
            render::render_scrollbar(
                Rect::new(area.x + area.width - 1, area.y, 1, area.height),
                buf,
                &self.state,
                self.options.style,
            );
        }
    }

    fn content_area(&self, area: Rect) -> Rect {
        if self.options.show_scrollbar && area.width >= 2 {
            Rect::new(area.x, area.y, area.width - 1, area.height)
        } else {
            area
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.modifiers.ctrl || key.modifiers.alt {
            return EditorAction::None;
        }
        match key.code {
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.after_edit()
            }
            KeyCode::Enter => {
                self.insert_newline();
                self.after_edit()
            }
            KeyCode::Tab => {
                let spaces = " ".repeat(self.options.tab_size);
                self.insert_str(&spaces);
                self.after_edit()
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    self.after_edit()
                } else {
                    EditorAction::None
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    self.after_edit()
                } else {
                    EditorAction::None
                }
            }
            KeyCode::Left => self.after_move(Self::move_left),
            KeyCode::Right => self.after_move(Self::move_right),
            KeyCode::Up => self.after_move(|e| e.move_vertical(-1)),
            KeyCode::Down => self.after_move(|e| e.move_vertical(1)),
            KeyCode::PageUp => {
                let rows = self.state.viewport_h.saturating_sub(1) as isize;
                self.after_move(|e| e.move_vertical(-rows.max(1)))
            }
            KeyCode::PageDown => {
                let rows = self.state.viewport_h.saturating_sub(1) as isize;
                self.after_move(|e| e.move_vertical(rows.max(1)))
            }
            KeyCode::Home => self.after_move(|e| e.cursor.col = 0),
            KeyCode::End => self.after_move(|e| e.cursor.col = e.current_line_char_len()),
            KeyCode::Esc => EditorAction::None,
        }
    }

    fn after_edit(&mut self) -> EditorAction {
        self.preferred_x = None;
        self.recompute_content_size();
        self.ensure_cursor_visible();
        EditorAction::Changed
    }

    fn after_move(&mut self, f: impl FnOnce(&mut Self)) -> EditorAction {
        f(self);
        self.ensure_cursor_visible();
        EditorAction::None
    }

    fn recompute_content_size(&mut self) {
        let content_w = self
            .lines
            .iter()
            .map(|l| UnicodeWidthStr::width(l.as_str()) as u32)
            .max()
            .unwrap_or(0);
        self.state.set_content(content_w + 1, self.lines.len() as u32);
    }

    fn ensure_cursor_visible(&mut self) {
        let (cx, cy) = self.cursor_screen_pos();
        let vh = self.state.viewport_h as u32;
        let vw = self.state.viewport_w as u32;
        if cy < self.state.y {
            self.state.y = cy;
        } else if vh > 0 && cy >= self.state.y + vh {
            self.state.y = cy + 1 - vh;
        }
        if cx < self.state.x {
            self.state.x = cx;
        } else if vw > 0 && cx >= self.state.x + vw {
            self.state.x = cx + 1 - vw;
        }
        self.state.clamp();
    }

    fn cursor_screen_pos(&self) -> (u32, u32) {
        (self.cursor_display_x() as u32, self.cursor.row as u32)
    }

    fn cursor_display_x(&self) -> usize {
        self.current_line()
            .chars()
            .take(self.cursor.col)
            .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
            .sum()
    }

    fn current_line(&self) -> &str {
        self.lines
            .get(self.cursor.row)
            .map(String::as_str)
            .unwrap_or("")
    }

    fn current_line_char_len(&self) -> usize {
        self.current_line().chars().count()
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.cursor.col = self.current_line_char_len();
        }
        self.preferred_x = None;
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.current_line_char_len() {
            self.cursor.col += 1;
        } else if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.cursor.col = 0;
        }
        self.preferred_x = None;
    }

    fn move_vertical(&mut self, delta: isize) {
        let target_row = (self.cursor.row as isize + delta).clamp(0, self.lines.len() as isize - 1);
        let target_x = self.preferred_x.unwrap_or_else(|| self.cursor_display_x());
        self.cursor.row = target_row as usize;
        self.cursor.col = col_from_display_x(self.current_line(), target_x);
        self.preferred_x = Some(target_x);
    }

    fn insert_char(&mut self, ch: char) {
        let row = self.cursor.row;
        let byte_idx = byte_index(&self.lines[row], self.cursor.col);
        self.lines[row].insert(byte_idx, ch);
        self.cursor.col += 1;
    }

    fn insert_newline(&mut self) {
        let row = self.cursor.row;
        let byte_idx = byte_index(&self.lines[row], self.cursor.col);
        let tail = self.lines[row].split_off(byte_idx);
        self.lines.insert(row + 1, tail);
        self.cursor = Cursor {
            row: row + 1,
            col: 0,
        };
    }

    fn insert_str(&mut self, s: &str) {
        let s = normalize_newlines(s);
        let mut parts = s.split('\n');
        let first = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();

        let row = self.cursor.row;
        let byte_idx = byte_index(&self.lines[row], self.cursor.col);
        let tail = self.lines[row].split_off(byte_idx);
        self.lines[row].push_str(first);

        match rest.split_last() {
            None => {
                self.cursor.col += first.chars().count();
                self.lines[row].push_str(&tail);
            }
            Some((last, middle)) => {
                let mut at = row + 1;
                for mid in middle {
                    self.lines.insert(at, (*mid).to_string());
                    at += 1;
                }
                self.lines.insert(at, format!("{last}{tail}"));
                self.cursor = Cursor {
                    row: at,
                    col: last.chars().count(),
                };
            }
        }
    }

    fn backspace(&mut self) -> bool {
        let row = self.cursor.row;
        if self.cursor.col > 0 {
            let line = &mut self.lines[row];
            let start = byte_index(line, self.cursor.col - 1);
            let end = byte_index(line, self.cursor.col);
            line.replace_range(start..end, "");
            self.cursor.col -= 1;
            return true;
        }
        if row > 0 {
            let cur = self.lines.remove(row);
            let prev = &mut self.lines[row - 1];
            let prev_len = prev.chars().count();
            prev.push_str(&cur);
            self.cursor = Cursor {
                row: row - 1,
                col: prev_len,
            };
            return true;
        }
        false
    }

    fn delete(&mut self) -> bool {
        let row = self.cursor.row;
        if self.cursor.col < self.current_line_char_len() {
            let line = &mut self.lines[row];
            let start = byte_index(line, self.cursor.col);
            let end = byte_index(line, self.cursor.col + 1);
            line.replace_range(start..end, "");
            return true;
        }
        if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
            return true;
        }
        false
    }
}

fn col_from_display_x(line: &str, target_x: usize) -> usize {
    let mut cols = 0usize;
    let mut col = 0usize;
    for ch in line.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > target_x {
            break;
        }
        cols += w;
        col += 1;
    }
    col
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyModifiers;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code))
    }

    fn type_str(ed: &mut EditorArea, s: &str) {
        for c in s.chars() {
            ed.input(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn inserts_and_moves_cursor() {
        let mut ed = EditorArea::new();
        assert_eq!(ed.input(key(KeyCode::Char('a'))), EditorAction::Changed);
        assert_eq!(ed.text(), "a");
        assert_eq!(ed.cursor(), Cursor { row: 0, col: 1 });
        assert_eq!(ed.input(key(KeyCode::Left)), EditorAction::None);
        ed.input(key(KeyCode::Char('b')));
        assert_eq!(ed.text(), "ba");
    }

    #[test]
    fn enter_always_inserts_newline() {
        let mut ed = EditorArea::new();
        type_str(&mut ed, "# Hi");
        assert_eq!(ed.input(key(KeyCode::Enter)), EditorAction::Changed);
        type_str(&mut ed, "x");
        assert_eq!(ed.text(), "# Hi\nx");
    }

    #[test]
    fn ctrl_chords_are_left_to_the_surface() {
        let mut ed = EditorArea::new();
        let ev = KeyEvent::new(KeyCode::Char('e')).with_modifiers(KeyModifiers::ctrl());
        assert_eq!(ed.input(InputEvent::Key(ev)), EditorAction::None);
        assert!(ed.is_empty());
    }

    #[test]
    fn backspace_joins_lines() {
        let mut ed = EditorArea::new();
        ed.set_text("a\nb");
        ed.cursor = Cursor { row: 1, col: 0 };
        assert_eq!(ed.input(key(KeyCode::Backspace)), EditorAction::Changed);
        assert_eq!(ed.text(), "ab");
        assert_eq!(ed.cursor(), Cursor { row: 0, col: 1 });
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut ed = EditorArea::new();
        ed.set_text("abc");
        assert_eq!(ed.input(key(KeyCode::Backspace)), EditorAction::None);
        assert_eq!(ed.text(), "abc");
    }

    #[test]
    fn delete_joins_next_line() {
        let mut ed = EditorArea::new();
        ed.set_text("a\nb");
        ed.input(key(KeyCode::End));
        assert_eq!(ed.input(key(KeyCode::Delete)), EditorAction::Changed);
        assert_eq!(ed.text(), "ab");
    }

    #[test]
    fn paste_multiline_keeps_tail() {
        let mut ed = EditorArea::new();
        ed.set_text("[]");
        ed.cursor = Cursor { row: 0, col: 1 };
        ed.input(InputEvent::Paste("a\r\nb\nc".to_string()));
        assert_eq!(ed.text(), "[a\nb\nc]");
        assert_eq!(ed.cursor(), Cursor { row: 2, col: 1 });
    }

    #[test]
    fn set_text_keeps_cursor_where_possible() {
        let mut ed = EditorArea::new();
        ed.set_text("hello\nworld");
        ed.cursor = Cursor { row: 1, col: 3 };
        ed.set_text("hello\nworld!");
        assert_eq!(ed.cursor(), Cursor { row: 1, col: 3 });
        ed.set_text("hi");
        assert_eq!(ed.cursor(), Cursor { row: 0, col: 2 });
    }

    #[test]
    fn trailing_newline_round_trips() {
        let mut ed = EditorArea::new();
        ed.set_text("a\n");
        assert_eq!(ed.text(), "a\n");
    }

    #[test]
    fn vertical_move_keeps_preferred_column() {
        let mut ed = EditorArea::new();
        ed.set_text("abcdef\nab\nabcdef");
        ed.input(key(KeyCode::End));
        ed.input(key(KeyCode::Down));
        assert_eq!(ed.cursor(), Cursor { row: 1, col: 2 });
        ed.input(key(KeyCode::Down));
        assert_eq!(ed.cursor(), Cursor { row: 2, col: 6 });
    }

    #[test]
    fn tab_inserts_spaces() {
        let mut ed = EditorArea::new();
        ed.input(key(KeyCode::Tab));
        assert_eq!(ed.text(), "    ");
    }

    #[test]
    fn renders_placeholder_when_empty() {
        let mut ed = EditorArea::with_options(EditorOptions {
            placeholder: "Enter markdown".to_string(),
            ..EditorOptions::default()
        });
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 2));
        ed.render_ref(Rect::new(0, 0, 20, 2), &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "E");
    }
}

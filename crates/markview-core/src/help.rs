use crate::keymap::Binding;
use crate::render;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;

#[derive(Clone, Debug)]
pub struct HelpBarOptions {
    pub style: Style,
    pub key_style: Style,
    pub separator: String,
}

impl Default for HelpBarOptions {
    fn default() -> Self {
        Self {
            style: Style::default(),
            key_style: Style::default(),
            separator: " • ".to_string(),
        }
    }
}

/// One-line list of `key desc` pairs, with an optional right-aligned status text.
#[derive(Clone, Debug, Default)]
pub struct HelpBar {
    bindings: Vec<Binding>,
    options: HelpBarOptions,
}

impl HelpBar {
    pub fn with_options(bindings: Vec<Binding>, options: HelpBarOptions) -> Self {
        Self { bindings, options }
    }

    pub fn render_ref(&self, area: Rect, buf: &mut Buffer, status: &str) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        buf.set_style(area, self.options.style);
        render::render_spans_clipped(
            area.x,
            area.y,
            0,
            area.width,
            buf,
            &self.to_spans(),
            self.options.style,
        );

        let status_w = unicode_width::UnicodeWidthStr::width(status) as u16;
        if status_w > 0 && status_w < area.width {
            render::render_str_clipped(
                area.x + area.width - status_w,
                area.y,
                0,
                status_w,
                buf,
                status,
                self.options.style,
            );
        }
    }

    fn to_spans(&self) -> Vec<Span<'static>> {
        let mut spans: Vec<Span<'static>> = Vec::new();
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(self.options.separator.clone(), self.options.style));
            }
            spans.push(Span::styled(b.help_key.clone(), self.options.key_style));
            spans.push(Span::styled(format!(" {}", b.help_desc), self.options.style));
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap;

    #[test]
    fn help_bar_renders_narrow_width() {
        let bindings = vec![keymap::Binding::new(
            "^q",
            "quit",
            vec![keymap::key_ctrl('q')],
        )];
        let hb = HelpBar::with_options(bindings, HelpBarOptions::default());
        let mut buf = Buffer::empty(Rect::new(0, 0, 3, 1));
        hb.render_ref(Rect::new(0, 0, 3, 1), &mut buf, "preview");
        assert_eq!(buf[(0, 0)].symbol(), "^");
    }

    #[test]
    fn status_is_right_aligned() {
        let hb = HelpBar::default();
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 1));
        hb.render_ref(Rect::new(0, 0, 10, 1), &mut buf, "EDIT");
        assert_eq!(buf[(6, 0)].symbol(), "E");
        assert_eq!(buf[(9, 0)].symbol(), "T");
    }
}

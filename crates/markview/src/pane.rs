use markview_core::render;
use markview_core::text::CodeHighlighter;
use markview_core::viewport::ViewportState;
use markview_core::wrapping::WrapMode;
use markview_core::wrapping::line_width;
use markview_core::wrapping::wrap_line;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

use crate::html::CellAlign;
use crate::html::CodeBlock;
use crate::html::Inline;
use crate::html::InlineStyle;
use crate::html::PaneBlock;
use crate::html::TableBlock;
use crate::html::TextBlock;
use crate::html::TextKind;
use crate::html::parse_blocks;

#[derive(Clone, Debug)]
pub struct PaneOptions {
    pub show_scrollbar: bool,
    pub show_line_numbers: bool,
    pub quote_prefix: String,
    pub code_style: Style,
    pub muted_style: Style,
    pub scrollbar_style: Style,
}

impl Default for PaneOptions {
    fn default() -> Self {
        Self {
            show_scrollbar: true,
            show_line_numbers: false,
            quote_prefix: "│ ".to_string(),
            code_style: Style::default().fg(Color::Yellow),
            muted_style: Style::default().fg(Color::DarkGray),
            scrollbar_style: Style::default().fg(Color::DarkGray),
        }
    }
}

/// Scrollable view over the HTML of a snapshot.
///
/// Code blocks are first shown plain; [`HtmlPane::highlight_code_blocks`] colours them in a
/// second pass once the pane has been drawn.
#[derive(Clone, Debug, Default)]
pub struct HtmlPane {
    blocks: Vec<PaneBlock>,
    highlighted: Vec<Option<Vec<Vec<Span<'static>>>>>,
    code_background: Option<Color>,
    lines: Vec<Line<'static>>,
    layout_width: Option<u16>,
    pub state: ViewportState,
    options: PaneOptions,
}

impl HtmlPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PaneOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Replaces the content. Scroll position is kept (clamped), highlighting starts over.
    pub fn set_html(&mut self, html: &str) {
        self.blocks = parse_blocks(html);
        self.highlighted = vec![None; self.blocks.len()];
        self.code_background = None;
        self.invalidate();
    }

    pub fn code_block_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, PaneBlock::Code(_)))
            .count()
    }

    pub fn is_highlighted(&self) -> bool {
        self.blocks
            .iter()
            .zip(&self.highlighted)
            .all(|(b, h)| !matches!(b, PaneBlock::Code(_)) || h.is_some())
    }

    /// Colours every code block that is not coloured yet. Returns how many were processed.
    pub fn highlight_code_blocks(&mut self, highlighter: &dyn CodeHighlighter) -> usize {
        let mut count = 0;
        for (block, slot) in self.blocks.iter().zip(self.highlighted.iter_mut()) {
            let PaneBlock::Code(code) = block else {
                continue;
            };
            if slot.is_some() {
                continue;
            }
            *slot = Some(highlighter.highlight_text(code.language.as_deref(), &code.code));
            count += 1;
        }
        if count > 0 {
            self.code_background = highlighter.background_color();
            self.invalidate();
        }
        count
    }

    pub fn scroll_by(&mut self, delta: i32) {
        self.state.scroll_y_by(delta);
    }

    pub fn page_down(&mut self) {
        self.state.page_down();
    }

    pub fn page_up(&mut self) {
        self.state.page_up();
    }

    /// Lines as plain strings for a given width.
    pub fn plain_lines(&mut self, width: u16) -> Vec<String> {
        self.ensure_layout(width);
        self.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let scrollbar = self.options.show_scrollbar && area.width > 1;
        let content_w = if scrollbar {
            area.width - 1
        } else {
            area.width
        };
        self.ensure_layout(content_w);

        let max_w = self.lines.iter().map(line_width).max().unwrap_or(0);
        self.state.set_viewport(content_w, area.height);
        self.state.set_content(max_w as u32, self.lines.len() as u32);

        let start = self.state.y as usize;
        for (row, line) in self
            .lines
            .iter()
            .skip(start)
            .take(area.height as usize)
            .enumerate()
        {
            render::render_spans_clipped(
                area.x,
                area.y + row as u16,
                self.state.x,
                content_w,
                buf,
                &line.spans,
                line.style,
            );
        }

        if scrollbar {
            let bar = Rect::new(area.x + content_w, area.y, 1, area.height);
            render::render_scrollbar(bar, buf, &self.state, self.options.scrollbar_style);
        }
    }

    fn invalidate(&mut self) {
        self.layout_width = None;
    }

    fn ensure_layout(&mut self, width: u16) {
        if self.layout_width == Some(width) {
            return;
        }
        self.lines = self.layout(width.max(1));
        self.layout_width = Some(width);
    }

    fn layout(&self, width: u16) -> Vec<Line<'static>> {
        let mut out: Vec<Line<'static>> = Vec::new();
        let mut prev: Option<&PaneBlock> = None;
        for (index, block) in self.blocks.iter().enumerate() {
            if let Some(prev) = prev
                && !continues_list(prev, block)
            {
                out.push(Line::default());
            }
            match block {
                PaneBlock::Text(text) => self.layout_text(text, width, &mut out),
                PaneBlock::Code(code) => self.layout_code(index, code, &mut out),
                PaneBlock::Table(table) => self.layout_table(table, &mut out),
                PaneBlock::Rule => out.push(Line::from(Span::styled(
                    "─".repeat(width as usize),
                    self.options.muted_style,
                ))),
            }
            prev = Some(block);
        }
        out
    }

    fn quote_prefix(&self, depth: usize) -> String {
        self.options.quote_prefix.repeat(depth)
    }

    fn layout_text(&self, block: &TextBlock, width: u16, out: &mut Vec<Line<'static>>) {
        let quote = self.quote_prefix(block.quote);
        let heading = match block.kind {
            TextKind::Heading(level) => Some(level),
            TextKind::Paragraph => None,
        };
        let marker = match (heading, &block.marker) {
            (Some(level), _) => format!("{} ", "#".repeat(level as usize)),
            (None, Some(marker)) => marker.clone(),
            (None, None) => String::new(),
        };
        let first_prefix = format!("{quote}{}{marker}", " ".repeat(block.indent));
        let hang = " ".repeat(block.indent + marker.width());
        let rest_prefix = format!("{quote}{hang}");
        let base = heading.map_or(Style::default(), heading_style);
        let wrap_width = width.saturating_sub(first_prefix.width() as u16).max(1);

        let mut first = true;
        for line in &block.lines {
            let spans: Vec<Span<'static>> = line
                .iter()
                .map(|inline| Span::styled(inline.text.clone(), self.inline_style(inline, base)))
                .collect();
            for wrapped in wrap_line(&Line::from(spans), wrap_width, WrapMode::Word) {
                let (prefix, style) = if first && heading.is_some() {
                    (first_prefix.clone(), base)
                } else if first {
                    (first_prefix.clone(), self.options.muted_style)
                } else {
                    (rest_prefix.clone(), self.options.muted_style)
                };
                first = false;
                let mut spans = vec![Span::styled(prefix, style)];
                spans.extend(wrapped.spans);
                out.push(Line::from(spans));
            }
        }
    }

    fn layout_code(&self, index: usize, block: &CodeBlock, out: &mut Vec<Line<'static>>) {
        let prefix = format!("{}{}", self.quote_prefix(block.quote), " ".repeat(block.indent));
        let highlighted = self.highlighted.get(index).and_then(Option::as_ref);
        let mut base = self.options.code_style;
        if highlighted.is_some()
            && let Some(bg) = self.code_background
        {
            base = Style::default().bg(bg);
        }
        let code_lines: Vec<&str> = block.code.split('\n').collect();
        let gutter_w = code_lines.len().to_string().len();

        for (n, text) in code_lines.iter().enumerate() {
            let mut spans = vec![Span::styled(prefix.clone(), self.options.muted_style)];
            if self.options.show_line_numbers {
                spans.push(Span::styled(
                    format!("{:>gutter_w$} │ ", n + 1),
                    self.options.muted_style,
                ));
            }
            match highlighted.and_then(|h| h.get(n)) {
                Some(colored) => spans.extend(
                    colored
                        .iter()
                        .map(|s| Span::styled(s.content.clone(), base.patch(s.style))),
                ),
                None => spans.push(Span::styled((*text).to_string(), base)),
            }
            out.push(Line::from(spans));
        }
    }

    fn layout_table(&self, table: &TableBlock, out: &mut Vec<Line<'static>>) {
        let columns = table
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(table.header.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }
        let mut widths = vec![3usize; columns];
        for row in std::iter::once(&table.header).chain(&table.rows) {
            for (col, cell) in row.iter().enumerate() {
                widths[col] = widths[col].max(cell_width(cell));
            }
        }

        let header_style = Style::default().add_modifier(Modifier::BOLD);
        if !table.header.is_empty() {
            out.push(self.table_row(&table.header, &widths, &table.aligns, header_style));
            let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            out.push(Line::from(Span::styled(
                rule.join("─┼─"),
                self.options.muted_style,
            )));
        }
        for row in &table.rows {
            out.push(self.table_row(row, &widths, &table.aligns, Style::default()));
        }
    }

    fn table_row(
        &self,
        row: &[Vec<Inline>],
        widths: &[usize],
        aligns: &[CellAlign],
        base: Style,
    ) -> Line<'static> {
        let mut spans: Vec<Span<'static>> = Vec::new();
        for (col, width) in widths.iter().enumerate() {
            if col > 0 {
                spans.push(Span::styled(" │ ", self.options.muted_style));
            }
            let cell = row.get(col).map(Vec::as_slice).unwrap_or(&[]);
            let pad = width.saturating_sub(cell_width(cell));
            let (left, right) = match aligns.get(col).copied().unwrap_or_default() {
                CellAlign::Right => (pad, 0),
                CellAlign::Center => (pad / 2, pad - pad / 2),
                CellAlign::Left | CellAlign::None => (0, pad),
            };
            if left > 0 {
                spans.push(Span::raw(" ".repeat(left)));
            }
            spans.extend(
                cell.iter()
                    .map(|inline| Span::styled(inline.text.clone(), self.inline_style(inline, base))),
            );
            if right > 0 {
                spans.push(Span::raw(" ".repeat(right)));
            }
        }
        Line::from(spans)
    }

    fn inline_style(&self, inline: &Inline, base: Style) -> Style {
        let InlineStyle {
            emphasis,
            strong,
            strike,
            code,
            link,
        } = inline.style;
        let mut style = base;
        if emphasis {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if strong {
            style = style.add_modifier(Modifier::BOLD);
        }
        if strike {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if code {
            style = style.patch(self.options.code_style);
        }
        if link {
            style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

fn heading_style(level: u8) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        1 => style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        2 => style.fg(Color::Cyan),
        _ => style.fg(Color::LightBlue),
    }
}

fn cell_width(cell: &[Inline]) -> usize {
    cell.iter().map(|i| i.text.width()).sum()
}

/// Tight list items follow each other without a blank line.
fn continues_list(prev: &PaneBlock, next: &PaneBlock) -> bool {
    let in_list = |b: &PaneBlock| match b {
        PaneBlock::Text(t) => t.marker.is_some() || t.indent > 0,
        PaneBlock::Code(c) => c.indent > 0,
        PaneBlock::Table(_) | PaneBlock::Rule => false,
    };
    let starts_item = matches!(next, PaneBlock::Text(t) if t.marker.is_some());
    in_list(prev) && starts_item
}

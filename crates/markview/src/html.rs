//! Reads the markup produced by the render transform back into blocks a terminal pane can lay
//! out.
//!
//! Parsing is left to `scraper`; the walk below only maps the tags the markdown renderer emits.
//! Anything else is transparent: unknown elements are dropped and their text is kept.

use scraper::Html;
use scraper::Node;
use scraper::node::Element;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub strike: bool,
    pub code: bool,
    pub link: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inline {
    pub text: String,
    pub style: InlineStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    Paragraph,
    Heading(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: TextKind,
    /// Block quote nesting depth.
    pub quote: usize,
    /// Columns of list indentation before the marker.
    pub indent: usize,
    /// `• ` or `3. ` on the first block of a list item.
    pub marker: Option<String>,
    /// Hard lines; `<br>` starts a new one.
    pub lines: Vec<Vec<Inline>>,
}

impl TextBlock {
    pub fn plain(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|i| i.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub quote: usize,
    pub indent: usize,
    pub code: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellAlign {
    #[default]
    None,
    Left,
    Center,
    Right,
}

pub type Cell = Vec<Inline>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableBlock {
    pub aligns: Vec<CellAlign>,
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaneBlock {
    Text(TextBlock),
    Code(CodeBlock),
    Table(TableBlock),
    Rule,
}

pub fn parse_blocks(html: &str) -> Vec<PaneBlock> {
    let fragment = Html::parse_fragment(html);
    let mut builder = Builder::default();
    let mut stack = vec![(fragment.tree.root(), false)];
    while let Some((node, closing)) = stack.pop() {
        match node.value() {
            Node::Element(el) if closing => builder.close(el.name()),
            Node::Element(el) => builder.open(el.name(), el),
            Node::Text(text) if !closing => builder.text(text),
            _ => {}
        }
        if !closing {
            stack.push((node, true));
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, false)));
        }
    }
    builder.finish()
}

#[derive(Clone, Copy, Debug)]
struct ListState {
    ordered: bool,
    next: u64,
}

#[derive(Debug)]
struct PreState {
    language: Option<String>,
    code: String,
}

#[derive(Debug, Default)]
struct TableState {
    block: TableBlock,
    in_head: bool,
    row: Vec<Cell>,
    cell: Option<Cell>,
}

#[derive(Debug, Default)]
struct Builder {
    blocks: Vec<PaneBlock>,
    current: Option<TextBlock>,
    quote: usize,
    lists: Vec<ListState>,
    pending_marker: Option<String>,
    emphasis: u32,
    strong: u32,
    strike: u32,
    code: u32,
    link: u32,
    pre: Option<PreState>,
    table: Option<TableState>,
}

impl Builder {
    fn style(&self) -> InlineStyle {
        InlineStyle {
            emphasis: self.emphasis > 0,
            strong: self.strong > 0,
            strike: self.strike > 0,
            code: self.code > 0,
            link: self.link > 0,
        }
    }

    fn indent(&self) -> usize {
        match self.lists.len() {
            0 => 0,
            n if self.pending_marker.is_some() => (n - 1) * 2,
            n => n * 2,
        }
    }

    fn open(&mut self, name: &str, el: &Element) {
        if let Some(pre) = &mut self.pre {
            if name == "code" && pre.language.is_none() {
                pre.language = el.attr("class")
                    .and_then(|c| c.strip_prefix("language-"))
                    .map(str::to_string);
            }
            return;
        }
        match name {
            "p" => self.start_text(TextKind::Paragraph),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(1);
                self.start_text(TextKind::Heading(level));
            }
            "blockquote" => {
                self.finish_text();
                self.quote += 1;
            }
            "ul" | "ol" => {
                self.finish_text();
                let next = el.attr("start")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1);
                self.lists.push(ListState {
                    ordered: name == "ol",
                    next,
                });
            }
            "li" => {
                self.finish_text();
                let marker = match self.lists.last_mut() {
                    Some(list) if list.ordered => {
                        let n = list.next;
                        list.next += 1;
                        format!("{n}. ")
                    }
                    _ => "• ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            "input" if el.attr("type") == Some("checkbox") => {
                let mark = if el.attr("checked").is_some() {
                    "[x]"
                } else {
                    "[ ]"
                };
                self.push_inline(mark, InlineStyle::default());
            }
            "br" => {
                if let Some(cell) = self.table_cell() {
                    cell.push(Inline {
                        text: " ".to_string(),
                        style: InlineStyle::default(),
                    });
                } else if let Some(current) = &mut self.current {
                    current.lines.push(Vec::new());
                }
            }
            "hr" => {
                self.finish_text();
                self.blocks.push(PaneBlock::Rule);
            }
            "pre" => {
                self.finish_text();
                self.pre = Some(PreState {
                    language: el.attr("data-lang").map(str::to_string),
                    code: String::new(),
                });
            }
            "img" => {
                if let Some(alt) = el.attr("alt").filter(|a| !a.is_empty()) {
                    self.push_inline(&format!("[{alt}]"), InlineStyle::default());
                }
            }
            "em" | "i" => self.emphasis += 1,
            "strong" | "b" => self.strong += 1,
            "del" | "s" => self.strike += 1,
            "code" => self.code += 1,
            "a" => self.link += 1,
            "table" => {
                self.finish_text();
                self.table = Some(TableState::default());
            }
            "thead" => {
                if let Some(table) = &mut self.table {
                    table.in_head = true;
                }
            }
            "tr" => {
                if let Some(table) = &mut self.table {
                    table.row.clear();
                }
            }
            "th" | "td" => {
                if let Some(table) = &mut self.table {
                    if table.in_head {
                        table.block.aligns.push(match el.attr("align") {
                            Some("left") => CellAlign::Left,
                            Some("center") => CellAlign::Center,
                            Some("right") => CellAlign::Right,
                            _ => CellAlign::None,
                        });
                    }
                    table.cell = Some(Vec::new());
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        if self.pre.is_some() {
            if name == "pre" {
                self.finish_pre();
            }
            return;
        }
        match name {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.finish_text(),
            "blockquote" => {
                self.finish_text();
                self.quote = self.quote.saturating_sub(1);
            }
            "ul" | "ol" => {
                self.finish_text();
                self.lists.pop();
                self.pending_marker = None;
            }
            "li" => {
                self.finish_text();
                if self.pending_marker.is_some() {
                    // Empty item: keep the marker visible.
                    self.start_text(TextKind::Paragraph);
                    self.finish_text();
                }
            }
            "em" | "i" => self.emphasis = self.emphasis.saturating_sub(1),
            "strong" | "b" => self.strong = self.strong.saturating_sub(1),
            "del" | "s" => self.strike = self.strike.saturating_sub(1),
            "code" => self.code = self.code.saturating_sub(1),
            "a" => self.link = self.link.saturating_sub(1),
            "thead" => {
                if let Some(table) = &mut self.table {
                    table.in_head = false;
                }
            }
            "tr" => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.row);
                    if table.in_head {
                        table.block.header = row;
                    } else {
                        table.block.rows.push(row);
                    }
                }
            }
            "th" | "td" => {
                if let Some(table) = &mut self.table
                    && let Some(mut cell) = table.cell.take()
                {
                    trim_inlines(&mut cell);
                    table.row.push(cell);
                }
            }
            "table" => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(PaneBlock::Table(table.block));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(pre) = &mut self.pre {
            pre.code.push_str(text);
            return;
        }
        let collapsed = collapse_whitespace(text);
        let style = self.style();
        if let Some(cell) = self.table_cell() {
            push_merged(cell, &collapsed, style);
            return;
        }
        if self.table.is_some() {
            return;
        }
        if self.current.is_none() && collapsed.trim().is_empty() {
            return;
        }
        self.push_inline(&collapsed, style);
    }

    fn table_cell(&mut self) -> Option<&mut Cell> {
        self.table.as_mut().and_then(|t| t.cell.as_mut())
    }

    fn push_inline(&mut self, text: &str, style: InlineStyle) {
        if self.current.is_none() {
            self.start_text(TextKind::Paragraph);
        }
        if let Some(current) = &mut self.current
            && let Some(line) = current.lines.last_mut()
        {
            push_merged(line, text, style);
        }
    }

    fn start_text(&mut self, kind: TextKind) {
        self.finish_text();
        let indent = self.indent();
        self.current = Some(TextBlock {
            kind,
            quote: self.quote,
            indent,
            marker: self.pending_marker.take(),
            lines: vec![Vec::new()],
        });
    }

    fn finish_text(&mut self) {
        let Some(mut block) = self.current.take() else {
            return;
        };
        for line in &mut block.lines {
            trim_inlines(line);
        }
        while block.lines.len() > 1 && block.lines.last().is_some_and(|l| l.is_empty()) {
            block.lines.pop();
        }
        let has_text = block.lines.iter().any(|l| !l.is_empty());
        if has_text || block.marker.is_some() {
            self.blocks.push(PaneBlock::Text(block));
        }
    }

    fn finish_pre(&mut self) {
        let Some(pre) = self.pre.take() else {
            return;
        };
        let mut code = pre.code;
        if code.ends_with('\n') {
            code.pop();
        }
        let indent = self.indent();
        self.blocks.push(PaneBlock::Code(CodeBlock {
            language: pre.language,
            quote: self.quote,
            indent,
            code,
        }));
        self.pending_marker = None;
    }

    fn finish(mut self) -> Vec<PaneBlock> {
        if self.pre.is_some() {
            self.finish_pre();
        }
        self.finish_text();
        if let Some(table) = self.table.take() {
            self.blocks.push(PaneBlock::Table(table.block));
        }
        self.blocks
    }
}

fn push_merged(line: &mut Vec<Inline>, text: &str, style: InlineStyle) {
    if text.is_empty() {
        return;
    }
    match line.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => line.push(Inline {
            text: text.to_string(),
            style,
        }),
    }
}

/// Newlines inside flowing text are soft; runs of whitespace read as one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.chars() {
        if ch == '\n' || ch == '\r' || ch == '\t' || ch == ' ' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out
}

fn trim_inlines(line: &mut Vec<Inline>) {
    if let Some(first) = line.first_mut() {
        let trimmed = first.text.trim_start().len();
        first.text.drain(..first.text.len() - trimmed);
    }
    if let Some(last) = line.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
    }
    line.retain(|i| !i.text.is_empty());
}

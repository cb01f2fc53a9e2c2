use std::sync::Arc;

use pulldown_cmark::Alignment;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use pulldown_cmark::html;

use crate::code::CodeBlock;
use crate::code::CodeBlockRenderer;
use crate::code::HtmlCodeBlockRenderer;
use crate::code::fence_language;
use crate::error::RenderError;
use crate::table::CellKind;
use crate::table::HtmlTableRenderer;
use crate::table::TableRenderer;
use crate::table::push_row;

/// Converts source text to display markup.
///
/// Implementations must be deterministic and free of I/O; the controller calls this on every
/// document change.
pub trait RenderTransform: Send + Sync {
    fn render(&self, text: &str) -> Result<String, RenderError>;
}

impl<F> RenderTransform for F
where
    F: Fn(&str) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, text: &str) -> Result<String, RenderError> {
        self(text)
    }
}

/// What to do with HTML embedded in the markdown source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RawHtml {
    /// Pass it through untouched.
    #[default]
    Allow,
    /// Show it as literal text.
    Escape,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Inputs longer than this are rejected with [`RenderError::InputTooLarge`].
    pub max_input_bytes: Option<usize>,
    pub raw_html: RawHtml,
}

#[derive(Clone)]
pub struct MarkdownRenderer {
    options: RenderOptions,
    code: Arc<dyn CodeBlockRenderer>,
    table: Arc<dyn TableRenderer>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            options,
            code: Arc::new(HtmlCodeBlockRenderer),
            table: Arc::new(HtmlTableRenderer),
        }
    }

    pub fn with_code_renderer(mut self, code: Arc<dyn CodeBlockRenderer>) -> Self {
        self.code = code;
        self
    }

    pub fn with_table_renderer(mut self, table: Arc<dyn TableRenderer>) -> Self {
        self.table = table;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn parser_options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options
    }

    fn render_events<'a, I>(&self, events: &mut I, out: &mut String) -> Result<(), RenderError>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut pending: Vec<Event<'a>> = Vec::new();
        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    flush(out, &mut pending);
                    let language = match &kind {
                        CodeBlockKind::Fenced(info) => fence_language(info).map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    let code = collect_code(events);
                    let block = CodeBlock {
                        language: language.as_deref(),
                        code: code.strip_suffix('\n').unwrap_or(&code),
                    };
                    self.code.render_code_block(&block, out)?;
                    out.push('\n');
                }
                Event::Start(Tag::Table(alignments)) => {
                    flush(out, &mut pending);
                    self.render_table(events, &alignments, out)?;
                }
                Event::Html(raw) | Event::InlineHtml(raw)
                    if self.options.raw_html == RawHtml::Escape =>
                {
                    pending.push(Event::Text(raw));
                }
                other => pending.push(other),
            }
        }
        flush(out, &mut pending);
        Ok(())
    }

    fn render_table<'a, I>(
        &self,
        events: &mut I,
        alignments: &[Alignment],
        out: &mut String,
    ) -> Result<(), RenderError>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut header = String::new();
        let mut body = String::new();
        let mut row: Vec<String> = Vec::new();
        let mut cell: Vec<Event<'a>> = Vec::new();
        let mut in_head = false;
        let mut in_cell = false;

        for event in events.by_ref() {
            match event {
                Event::Start(Tag::TableHead) => in_head = true,
                Event::End(TagEnd::TableHead) => {
                    if !row.is_empty() {
                        push_row(&mut header, &row, alignments, CellKind::Header);
                        row.clear();
                    }
                    in_head = false;
                }
                Event::Start(Tag::TableRow) => row.clear(),
                Event::End(TagEnd::TableRow) => {
                    let (target, kind) = if in_head {
                        (&mut header, CellKind::Header)
                    } else {
                        (&mut body, CellKind::Data)
                    };
                    push_row(target, &row, alignments, kind);
                    row.clear();
                }
                Event::Start(Tag::TableCell) => {
                    in_cell = true;
                    cell.clear();
                }
                Event::End(TagEnd::TableCell) => {
                    in_cell = false;
                    let mut html_cell = String::new();
                    html::push_html(&mut html_cell, cell.drain(..));
                    row.push(html_cell);
                }
                Event::End(TagEnd::Table) => break,
                Event::Html(raw) | Event::InlineHtml(raw)
                    if in_cell && self.options.raw_html == RawHtml::Escape =>
                {
                    cell.push(Event::Text(raw));
                }
                other if in_cell => cell.push(other),
                _ => {}
            }
        }

        self.table.render_table(&header, &body, out)
    }
}

impl RenderTransform for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        if let Some(limit) = self.options.max_input_bytes
            && text.len() > limit
        {
            return Err(RenderError::InputTooLarge {
                len: text.len(),
                limit,
            });
        }

        let mut events = Parser::new_ext(text, Self::parser_options());
        let mut out = String::with_capacity(text.len() + text.len() / 2);
        self.render_events(&mut events, &mut out)?;
        Ok(out)
    }
}

fn flush<'a>(out: &mut String, pending: &mut Vec<Event<'a>>) {
    if !pending.is_empty() {
        html::push_html(out, pending.drain(..));
    }
}

fn collect_code<'a, I>(events: &mut I) -> String
where
    I: Iterator<Item = Event<'a>>,
{
    let mut code = String::new();
    for event in events.by_ref() {
        match event {
            Event::End(TagEnd::CodeBlock) => break,
            Event::Text(text) => code.push_str(&text),
            _ => {}
        }
    }
    code
}

use pulldown_cmark::Alignment;

use crate::error::RenderError;

/// Wraps already-rendered header and body rows into the final table markup.
///
/// `header` and `body` are sequences of `<tr>…</tr>\n` rows.
pub trait TableRenderer: Send + Sync {
    fn render_table(&self, header: &str, body: &str, out: &mut String) -> Result<(), RenderError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlTableRenderer;

impl TableRenderer for HtmlTableRenderer {
    fn render_table(&self, header: &str, body: &str, out: &mut String) -> Result<(), RenderError> {
        out.push_str("<table>\n<thead>\n");
        out.push_str(header);
        out.push_str("</thead>\n<tbody>\n");
        out.push_str(body);
        out.push_str("</tbody>\n</table>\n");
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CellKind {
    Header,
    Data,
}

/// Appends one `<tr>` with a cell per entry of `cells`, aligned per column.
pub(crate) fn push_row(out: &mut String, cells: &[String], alignments: &[Alignment], kind: CellKind) {
    let tag = match kind {
        CellKind::Header => "th",
        CellKind::Data => "td",
    };
    out.push_str("<tr>\n");
    for (i, cell) in cells.iter().enumerate() {
        out.push('<');
        out.push_str(tag);
        match alignments.get(i) {
            Some(Alignment::Left) => out.push_str(" align=\"left\""),
            Some(Alignment::Center) => out.push_str(" align=\"center\""),
            Some(Alignment::Right) => out.push_str(" align=\"right\""),
            Some(Alignment::None) | None => {}
        }
        out.push('>');
        out.push_str(cell);
        out.push_str("</");
        out.push_str(tag);
        out.push_str(">\n");
    }
    out.push_str("</tr>\n");
}

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Span;

/// Syntax highlighting applied to fenced code after a pane has been populated.
///
/// `language` is the fence identifier exactly as the render transform tagged it (for example
/// `"js"` or the `"text"` fallback). Implementations return one span list per input line.
pub trait CodeHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>>;

    fn highlight_text(&self, language: Option<&str>, text: &str) -> Vec<Vec<Span<'static>>> {
        let lines: Vec<&str> = text.split('\n').collect();
        self.highlight_lines(language, &lines)
    }

    fn background_color(&self) -> Option<Color> {
        None
    }
}

pub struct NoHighlight;

impl CodeHighlighter for NoHighlight {
    fn highlight_lines(&self, _language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>> {
        lines
            .iter()
            .map(|l| vec![Span::styled((*l).to_string(), Style::default())])
            .collect()
    }
}

use markview_core::text::CodeHighlighter;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::FontStyle;
use syntect::highlighting::Style as SynStyle;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

use crate::UnknownTheme;

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .get(DEFAULT_THEME)
            .cloned()
            .or_else(|| theme_set.themes.values().next().cloned())
            .unwrap_or_default();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    pub fn with_theme(name: &str) -> Result<Self, UnknownTheme> {
        let mut theme_set = ThemeSet::load_defaults();
        let Some(theme) = theme_set.themes.remove(name) else {
            let mut available: Vec<String> = theme_set.themes.keys().cloned().collect();
            available.sort();
            return Err(UnknownTheme {
                name: name.to_string(),
                available,
            });
        };
        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    /// Resolves a fence identifier by file extension first (`rs`, `js`), then by syntax name
    /// (`rust`, `javascript`). Unknown identifiers, including the `text` fallback, are plain.
    fn syntax_for(&self, language: Option<&str>) -> &SyntaxReference {
        language
            .and_then(|lang| {
                self.syntax_set
                    .find_syntax_by_extension(lang)
                    .or_else(|| self.syntax_set.find_syntax_by_token(lang))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Span<'static>>> {
        let syntax = self.syntax_for(language);
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        lines
            .iter()
            .map(|line| {
                // The newline-aware syntax set expects each line to end with `\n`.
                let with_newline = format!("{line}\n");
                let regions = highlighter
                    .highlight_line(&with_newline, &self.syntax_set)
                    .unwrap_or_default();
                let spans: Vec<Span<'static>> = regions
                    .into_iter()
                    .filter_map(|(style, s)| {
                        let s = s.trim_end_matches('\n');
                        (!s.is_empty()).then(|| Span::styled(s.to_string(), to_ratatui(style)))
                    })
                    .collect();
                if spans.is_empty() {
                    vec![Span::raw((*line).to_string())]
                } else {
                    spans
                }
            })
            .collect()
    }

    fn background_color(&self) -> Option<Color> {
        self.theme
            .settings
            .background
            .map(|c| Color::Rgb(c.r, c.g, c.b))
    }
}

fn to_ratatui(s: SynStyle) -> Style {
    let mut out = Style::default().fg(Color::Rgb(s.foreground.r, s.foreground.g, s.foreground.b));
    if s.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if s.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if s.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(spans: &[Span<'static>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn keeps_line_count_and_text() {
        let h = SyntectHighlighter::new();
        let out = h.highlight_lines(Some("js"), &["let a = 1 < 2;", "", "}"]);
        assert_eq!(out.len(), 3);
        assert_eq!(plain(&out[0]), "let a = 1 < 2;");
        assert_eq!(plain(&out[1]), "");
    }

    #[test]
    fn fallback_language_is_plain_text() {
        let h = SyntectHighlighter::new();
        let out = h.highlight_lines(Some("text"), &["<b>"]);
        assert_eq!(plain(&out[0]), "<b>");
    }

    #[test]
    fn colours_keywords() {
        let h = SyntectHighlighter::new();
        let out = h.highlight_lines(Some("rust"), &["fn main() {}"]);
        assert!(out[0].len() > 1);
    }

    #[test]
    fn unknown_theme_lists_alternatives() {
        let err = SyntectHighlighter::with_theme("nope").err().unwrap();
        assert_eq!(err.name, "nope");
        assert!(err.available.iter().any(|t| t == DEFAULT_THEME));
    }
}

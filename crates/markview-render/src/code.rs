use crate::error::RenderError;
use crate::escape::escape_html_into;

/// Language recorded for code blocks that have no fence identifier.
pub const FALLBACK_LANGUAGE: &str = "text";

/// One code block as handed to a [`CodeBlockRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// First word of the fence info string; `None` for indented blocks and bare fences.
    pub language: Option<&'a str>,
    /// Raw block contents without the final newline.
    pub code: &'a str,
}

impl CodeBlock<'_> {
    pub fn language_or_fallback(&self) -> &str {
        self.language.unwrap_or(FALLBACK_LANGUAGE)
    }
}

pub trait CodeBlockRenderer: Send + Sync {
    fn render_code_block(&self, block: &CodeBlock<'_>, out: &mut String) -> Result<(), RenderError>;
}

/// Emits `<pre data-lang="L"><code class="language-L">…</code></pre>` with the body escaped.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlCodeBlockRenderer;

impl CodeBlockRenderer for HtmlCodeBlockRenderer {
    fn render_code_block(&self, block: &CodeBlock<'_>, out: &mut String) -> Result<(), RenderError> {
        let lang = block.language_or_fallback();
        out.push_str("<pre data-lang=\"");
        escape_html_into(out, lang);
        out.push_str("\"><code class=\"language-");
        escape_html_into(out, lang);
        out.push_str("\">");
        escape_html_into(out, block.code);
        out.push_str("</code></pre>");
        Ok(())
    }
}

/// Extracts the language from a fence info string such as `"rust ignore"`.
pub fn fence_language(info: &str) -> Option<&str> {
    info.split_whitespace().next().filter(|l| !l.is_empty())
}

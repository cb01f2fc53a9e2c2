use std::sync::Arc;

use markview_render::CodeBlock;
use markview_render::CodeBlockRenderer;
use markview_render::FormatterKind;
use markview_render::MarkdownRenderer;
use markview_render::RenderError;
use markview_render::RenderTransform;
use markview_render::TableRenderer;

const SAMPLE: &str = r#"# Notes

Some *emphasis*, **strong**, ~~gone~~ and `inline <code>`.

- [x] done
- [ ] todo

| Name | Value |
|------|:-----:|
| foo  | 1     |

```js
let a = 1 < 2;
```

> quoted
"#;

#[test]
fn heading_and_js_block_scenario() {
    let html = MarkdownRenderer::new()
        .render("# Hi\n\n```js\nlet a = 1 < 2;\n```")
        .unwrap();
    assert!(html.contains("<h1>Hi</h1>"));
    assert!(html.contains(r#"<pre data-lang="js">"#));
    assert!(html.contains("let a = 1 &lt; 2;"));
}

#[test]
fn rendering_is_deterministic() {
    let renderer = MarkdownRenderer::new();
    let a = renderer.render(SAMPLE).unwrap();
    let b = renderer.render(SAMPLE).unwrap();
    assert_eq!(a, b);

    let other = MarkdownRenderer::new();
    assert_eq!(a, other.render(SAMPLE).unwrap());
}

#[test]
fn script_in_code_block_is_fully_escaped() {
    let html = MarkdownRenderer::new()
        .render("```html\n<script>&\"'\n```\n")
        .unwrap();
    assert!(html.contains("&lt;script&gt;&amp;&quot;&#39;"));
    assert!(!html.contains("<script>"));
}

#[test]
fn sample_covers_gfm_features() {
    let html = MarkdownRenderer::new().render(SAMPLE).unwrap();
    assert!(html.contains("<em>emphasis</em>"));
    assert!(html.contains("<strong>strong</strong>"));
    assert!(html.contains("<del>gone</del>"));
    assert!(html.contains("<code>inline &lt;code&gt;</code>"));
    assert!(html.contains(r#"<input disabled="" type="checkbox" checked=""/>"#));
    assert!(html.contains("<table>\n<thead>\n<tr>\n<th>Name</th>\n<th align=\"center\">Value</th>"));
    assert!(html.contains("<blockquote>"));
}

struct Upper;

impl CodeBlockRenderer for Upper {
    fn render_code_block(&self, block: &CodeBlock<'_>, out: &mut String) -> Result<(), RenderError> {
        out.push_str(&block.code.to_uppercase());
        Ok(())
    }
}

struct Broken;

impl TableRenderer for Broken {
    fn render_table(&self, _header: &str, _body: &str, _out: &mut String) -> Result<(), RenderError> {
        Err(RenderError::formatter(FormatterKind::Table, "nope"))
    }
}

#[test]
fn custom_code_renderer_is_used() {
    let html = MarkdownRenderer::new()
        .with_code_renderer(Arc::new(Upper))
        .render("```\nabc\n```")
        .unwrap();
    assert_eq!(html, "ABC\n");
}

#[test]
fn formatter_failure_surfaces_as_error() {
    let err = MarkdownRenderer::new()
        .with_table_renderer(Arc::new(Broken))
        .render("| a |\n|---|\n| b |\n")
        .unwrap_err();
    assert_eq!(err, RenderError::formatter(FormatterKind::Table, "nope"));
    assert_eq!(err.to_string(), "table formatter failed: nope");
}

//! Markdown to HTML transform used by the markview controller.
//!
//! The transform is a pure function of its input and configuration: the same text rendered by the
//! same [`MarkdownRenderer`] always yields byte-identical HTML. Parsing is delegated to
//! `pulldown-cmark` (GitHub-flavoured tables, strikethrough and task lists; soft breaks stay
//! newlines). Two block kinds are routed through pluggable formatters:
//!
//! - fenced and indented code blocks go to a [`CodeBlockRenderer`] (default:
//!   [`HtmlCodeBlockRenderer`], entity-escaped and tagged with `data-lang`)
//! - tables go to a [`TableRenderer`] (default: [`HtmlTableRenderer`])
//!
//! ```
//! use markview_render::MarkdownRenderer;
//! use markview_render::RenderTransform;
//!
//! let html = MarkdownRenderer::new().render("# Hi").unwrap();
//! assert_eq!(html, "<h1>Hi</h1>\n");
//! ```
pub mod code;
pub mod escape;
pub mod table;

mod error;
mod transform;

pub use code::CodeBlock;
pub use code::CodeBlockRenderer;
pub use code::FALLBACK_LANGUAGE;
pub use code::HtmlCodeBlockRenderer;
pub use error::FormatterKind;
pub use error::RenderError;
pub use table::HtmlTableRenderer;
pub use table::TableRenderer;
pub use transform::MarkdownRenderer;
pub use transform::RawHtml;
pub use transform::RenderOptions;
pub use transform::RenderTransform;

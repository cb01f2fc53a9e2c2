//! Highlighting backends for code blocks shown in markview panes.
//!
//! The pane calls a [`markview_core::text::CodeHighlighter`] once per code block after the
//! snapshot has been painted. This crate provides:
//! - `syntect` (feature: `syntect`), themed with any of syntect's bundled themes
//!
//! Without a backend the surface falls back to [`markview_core::text::NoHighlight`].
#[cfg(feature = "syntect")]
pub mod syntect;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown syntax theme `{name}` (available: {})", available.join(", "))]
pub struct UnknownTheme {
    pub name: String,
    pub available: Vec<String>,
}

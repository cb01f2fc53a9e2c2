use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatterKind {
    CodeBlock,
    Table,
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatterKind::CodeBlock => f.write_str("code block"),
            FormatterKind::Table => f.write_str("table"),
        }
    }
}

/// A render that could not produce HTML. The caller keeps showing whatever it rendered last.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("input is {len} bytes, over the {limit} byte limit")]
    InputTooLarge { len: usize, limit: usize },

    #[error("{kind} formatter failed: {message}")]
    Formatter { kind: FormatterKind, message: String },
}

impl RenderError {
    pub fn formatter(kind: FormatterKind, message: impl Into<String>) -> Self {
        Self::Formatter {
            kind,
            message: message.into(),
        }
    }
}

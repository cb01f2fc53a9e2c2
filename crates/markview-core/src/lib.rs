//! `markview-core` holds the terminal building blocks the markview surface is drawn with.
//!
//! Nothing in here knows about documents, snapshots, or the controller protocol. The crate only
//! provides:
//! - an event-loop agnostic input model ([`input`]) and its crossterm mapping (feature
//!   `crossterm`)
//! - key bindings and a one-line help bar ([`keymap`], [`help`])
//! - scroll state and clipped drawing helpers ([`viewport`], [`render`], [`wrapping`])
//! - the [`text::CodeHighlighter`] seam used by the post-render highlighting pass
//! - [`editor::EditorArea`], the multi-line text input backing the edit layout
//!
//! All components run on the caller's thread; there is no async runtime.
pub mod text;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod render;
pub mod viewport;
pub mod wrapping;

pub mod editor;
pub mod help;
pub mod input;
pub mod keymap;

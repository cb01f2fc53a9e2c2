//! `markview` keeps a live preview of a markdown document next to an optional editor.
//!
//! Two sides talk over a JSON message channel:
//! - the controller side ([`registry`], [`controller`]) owns the document handle, renders it with
//!   [`markview_render::MarkdownRenderer`] and pushes full snapshots
//! - the display side ([`surface`], [`app`]) mirrors the last snapshot, debounces edits back and
//!   lets the user toggle between the preview and edit layouts
//!
//! Documents live in a [`document::Workspace`], which announces every change to its listeners.
pub mod app;
pub mod channel;
pub mod cli;
pub mod config;
pub mod controller;
pub mod document;
pub mod html;
pub mod logging;
pub mod pane;
pub mod protocol;
pub mod registry;
pub mod surface;
pub mod watch;

//! Picks up edits made to the file outside markview.
use std::path::Path;

use notify::Config;
use notify::Event;
use notify::EventKind;
use notify::RecommendedWatcher;
use notify::RecursiveMode;
use notify::Watcher;
use tracing::debug;
use tracing::warn;

use crate::document::DocumentId;
use crate::document::Workspace;

/// Keeps a filesystem watcher alive for one document. Dropping it stops watching.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
}

impl DocumentWatcher {
    /// Every modification of `path` reloads `document` into `workspace`, which notifies the
    /// document's listeners when the text actually changed.
    pub fn spawn(
        workspace: Workspace,
        document: DocumentId,
        path: &Path,
    ) -> notify::Result<Self> {
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => match workspace.reload(document) {
                    Ok(changed) => debug!(%document, changed, "reloaded after file change"),
                    Err(err) => warn!(%document, %err, "reload failed"),
                },
                Ok(_) => {}
                Err(err) => warn!(%err, "file watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        debug!(%document, path = %path.display(), "watching for outside changes");
        Ok(Self { _watcher: watcher })
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

//! The host document API the controller renders from and edits through.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Identity of one opened document instance. Two opens of the same path get different ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub document: DocumentId,
    pub version: u64,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is closed")]
    Closed(DocumentId),
}

pub trait TextDocument: Send + Sync {
    fn id(&self) -> DocumentId;

    /// Full current text.
    fn text(&self) -> String;

    /// Replaces the entire content, first character to last. Equivalent to one full-range edit.
    fn replace_all(&self, text: &str) -> Result<(), DocumentError>;
}

pub type Listener = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

pub trait ChangeFeed: Send + Sync {
    /// Registers `listener` for every change of every document. Dropping the returned
    /// [`Subscription`] unregisters it.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct DocumentState {
    path: PathBuf,
    text: String,
    version: u64,
}

#[derive(Default)]
struct Listeners {
    next: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Shared {
    documents: Mutex<HashMap<DocumentId, DocumentState>>,
    listeners: Mutex<Listeners>,
}

impl Shared {
    fn broadcast(&self, event: ChangeEvent) {
        let listeners = self.listeners.lock();
        debug!(document = %event.document, version = event.version, listeners = listeners.entries.len(), "document changed");
        for (_, listener) in &listeners.entries {
            listener(&event);
        }
    }
}

/// File-backed documents plus the change feed that announces their edits.
///
/// Cloning is cheap; clones share the same documents and listeners.
#[derive(Clone, Default)]
pub struct Workspace {
    shared: Arc<Shared>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<Arc<FileDocument>, DocumentError> {
        let path = path.as_ref().to_path_buf();
        let text = read(&path)?;
        let id = DocumentId::next();
        info!(document = %id, path = %path.display(), bytes = text.len(), "opened document");
        self.shared.documents.lock().insert(
            id,
            DocumentState {
                path: path.clone(),
                text,
                version: 0,
            },
        );
        Ok(Arc::new(FileDocument {
            id,
            path,
            shared: self.shared.clone(),
        }))
    }

    pub fn close(&self, id: DocumentId) {
        if self.shared.documents.lock().remove(&id).is_some() {
            debug!(document = %id, "closed document");
        }
    }

    pub fn path(&self, id: DocumentId) -> Option<PathBuf> {
        self.shared.documents.lock().get(&id).map(|d| d.path.clone())
    }

    pub fn version(&self, id: DocumentId) -> Option<u64> {
        self.shared.documents.lock().get(&id).map(|d| d.version)
    }

    /// Re-reads the file behind `id` after an outside change. Returns whether the text changed;
    /// listeners are only notified when it did.
    pub fn reload(&self, id: DocumentId) -> Result<bool, DocumentError> {
        let path = self.path(id).ok_or(DocumentError::Closed(id))?;
        let text = read(&path)?;
        let event = {
            let mut documents = self.shared.documents.lock();
            let state = documents.get_mut(&id).ok_or(DocumentError::Closed(id))?;
            if state.text == text {
                return Ok(false);
            }
            state.text = text;
            state.version += 1;
            ChangeEvent {
                document: id,
                version: state.version,
            }
        };
        self.shared.broadcast(event);
        Ok(true)
    }
}

impl ChangeFeed for Workspace {
    fn subscribe(&self, listener: Listener) -> Subscription {
        let key = {
            let mut listeners = self.shared.listeners.lock();
            let key = listeners.next;
            listeners.next += 1;
            listeners.entries.push((key, listener));
            key
        };
        let shared = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.listeners.lock().entries.retain(|(k, _)| *k != key);
            }
        })
    }
}

/// A document opened through a [`Workspace`].
pub struct FileDocument {
    id: DocumentId,
    path: PathBuf,
    shared: Arc<Shared>,
}

impl FileDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for FileDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDocument")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

impl TextDocument for FileDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn text(&self) -> String {
        self.shared
            .documents
            .lock()
            .get(&self.id)
            .map(|d| d.text.clone())
            .unwrap_or_default()
    }

    fn replace_all(&self, text: &str) -> Result<(), DocumentError> {
        let unchanged = self
            .shared
            .documents
            .lock()
            .get(&self.id)
            .map(|state| state.text == text)
            .ok_or(DocumentError::Closed(self.id))?;
        if unchanged {
            return Ok(());
        }

        // The lock is not held across the write; a reload may land in between.
        fs::write(&self.path, text).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })?;

        let event = {
            let mut documents = self.shared.documents.lock();
            let state = documents
                .get_mut(&self.id)
                .ok_or(DocumentError::Closed(self.id))?;
            if state.text == text {
                return Ok(());
            }
            state.text = text.to_string();
            state.version += 1;
            ChangeEvent {
                document: self.id,
                version: state.version,
            }
        };
        self.shared.broadcast(event);
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, DocumentError> {
    fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn workspace_with(text: &str) -> (tempfile::TempDir, Workspace, Arc<FileDocument>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, text).unwrap();
        let ws = Workspace::new();
        let doc = ws.open(&path).unwrap();
        (dir, ws, doc)
    }

    fn record(ws: &Workspace) -> (Subscription, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel();
        let sub = ws.subscribe(Box::new(move |ev: &ChangeEvent| {
            let _ = tx.send(*ev);
        }));
        (sub, rx)
    }

    #[test]
    fn ids_are_unique_per_open() {
        let (dir, ws, a) = workspace_with("x");
        let b = ws.open(dir.path().join("notes.md")).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn replace_all_writes_file_and_notifies_once() {
        let (_dir, ws, doc) = workspace_with("old");
        let (_sub, rx) = record(&ws);

        doc.replace_all("abc").unwrap();

        assert_eq!(doc.text(), "abc");
        assert_eq!(fs::read_to_string(doc.path()).unwrap(), "abc");
        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent {
                document: doc.id(),
                version: 1
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn identical_replace_is_silent() {
        let (_dir, ws, doc) = workspace_with("same");
        let (_sub, rx) = record(&ws);
        doc.replace_all("same").unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(ws.version(doc.id()), Some(0));
    }

    #[test]
    fn dropping_subscription_stops_notifications() {
        let (_dir, ws, doc) = workspace_with("");
        let (sub, rx) = record(&ws);
        drop(sub);
        doc.replace_all("x").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reload_notifies_only_on_difference() {
        let (_dir, ws, doc) = workspace_with("one");
        let (_sub, rx) = record(&ws);

        assert!(!ws.reload(doc.id()).unwrap());
        fs::write(doc.path(), "two").unwrap();
        assert!(ws.reload(doc.id()).unwrap());

        assert_eq!(doc.text(), "two");
        assert_eq!(rx.try_recv().unwrap().version, 1);
    }

    #[test]
    fn closed_document_rejects_edits() {
        let (_dir, ws, doc) = workspace_with("x");
        ws.close(doc.id());
        assert!(matches!(
            doc.replace_all("y"),
            Err(DocumentError::Closed(id)) if id == doc.id()
        ));
    }

    #[test]
    fn failed_write_leaves_text_unchanged() {
        let (dir, ws, doc) = workspace_with("keep");
        let (_sub, rx) = record(&ws);
        dir.close().unwrap();

        assert!(matches!(doc.replace_all("lost"), Err(DocumentError::Io { .. })));
        assert_eq!(doc.text(), "keep");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reload_racing_a_replace_notifies_once() {
        let (_dir, ws, doc) = workspace_with("old");
        let (_sub, rx) = record(&ws);

        // The watcher picked up the write before the replace committed.
        fs::write(doc.path(), "new").unwrap();
        assert!(ws.reload(doc.id()).unwrap());
        doc.replace_all("new").unwrap();

        assert_eq!(doc.text(), "new");
        assert_eq!(ws.version(doc.id()), Some(1));
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn open_missing_file_reports_path() {
        let err = Workspace::new().open("/definitely/not/here.md").unwrap_err();
        assert!(err.to_string().starts_with("/definitely/not/here.md: "));
    }
}

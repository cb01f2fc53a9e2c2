use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;

use markview_render::RenderTransform;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::channel::SurfaceId;
use crate::channel::SurfaceSink;
use crate::controller::PreviewController;
use crate::controller::RenderOutcome;
use crate::document::ChangeEvent;
use crate::document::ChangeFeed;
use crate::document::DocumentId;
use crate::document::TextDocument;
use crate::protocol;
use crate::protocol::SurfaceMessage;

/// Everything the controller thread reacts to.
pub enum ControllerEvent {
    Attach {
        surface: SurfaceId,
        document: Arc<dyn TextDocument>,
        sink: Box<dyn SurfaceSink>,
        /// Where change notifications for this surface are queued. Usually a clone of the
        /// sender feeding [`ViewRegistry::run`].
        notify: Sender<ControllerEvent>,
        reply: Sender<Result<(), AttachError>>,
    },
    Document {
        surface: SurfaceId,
        event: ChangeEvent,
    },
    /// A JSON payload posted by a surface.
    Surface {
        surface: SurfaceId,
        payload: String,
    },
    Disposed(SurfaceId),
    Shutdown,
}

impl fmt::Debug for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::Attach {
                surface, document, ..
            } => f
                .debug_struct("Attach")
                .field("surface", surface)
                .field("document", &document.id())
                .finish_non_exhaustive(),
            ControllerEvent::Document { surface, event } => f
                .debug_struct("Document")
                .field("surface", surface)
                .field("event", event)
                .finish(),
            ControllerEvent::Surface { surface, payload } => f
                .debug_struct("Surface")
                .field("surface", surface)
                .field("payload", payload)
                .finish(),
            ControllerEvent::Disposed(surface) => f.debug_tuple("Disposed").field(surface).finish(),
            ControllerEvent::Shutdown => f.write_str("Shutdown"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttachError {
    #[error("{0} already has an open preview")]
    AlreadyOpen(DocumentId),
    #[error("{0} is already attached")]
    SurfaceInUse(SurfaceId),
}

/// Owns every live [`PreviewController`], one per surface.
pub struct ViewRegistry {
    feed: Arc<dyn ChangeFeed>,
    transform: Arc<dyn RenderTransform>,
    views: HashMap<SurfaceId, PreviewController>,
}

impl ViewRegistry {
    pub fn new(feed: Arc<dyn ChangeFeed>, transform: Arc<dyn RenderTransform>) -> Self {
        Self {
            feed,
            transform,
            views: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn controller(&self, surface: SurfaceId) -> Option<&PreviewController> {
        self.views.get(&surface)
    }

    /// Creates the controller for `surface`, subscribes it to changes and pushes the first
    /// snapshot.
    pub fn attach(
        &mut self,
        surface: SurfaceId,
        document: Arc<dyn TextDocument>,
        sink: Box<dyn SurfaceSink>,
        notify: Sender<ControllerEvent>,
    ) -> Result<RenderOutcome, AttachError> {
        if self.views.contains_key(&surface) {
            return Err(AttachError::SurfaceInUse(surface));
        }
        let id = document.id();
        if self.views.values().any(|c| c.document().id() == id) {
            return Err(AttachError::AlreadyOpen(id));
        }

        let subscription = self.feed.subscribe(Box::new(move |event: &ChangeEvent| {
            let _ = notify.send(ControllerEvent::Document {
                surface,
                event: *event,
            });
        }));
        let mut controller = PreviewController::new(document, sink, self.transform.clone())
            .with_subscription(subscription);
        let outcome = controller.render();
        info!(%surface, document = %id, ?outcome, "preview attached");
        if !controller.is_disposed() {
            self.views.insert(surface, controller);
        }
        Ok(outcome)
    }

    pub fn dispose(&mut self, surface: SurfaceId) {
        if let Some(mut controller) = self.views.remove(&surface) {
            controller.dispose();
        }
    }

    pub fn handle(&mut self, event: ControllerEvent) -> ControlFlow<()> {
        match event {
            ControllerEvent::Attach {
                surface,
                document,
                sink,
                notify,
                reply,
            } => {
                let result = self.attach(surface, document, sink, notify).map(|_| ());
                if let Err(err) = &result {
                    warn!(%err, "attach rejected");
                }
                let _ = reply.send(result);
            }
            ControllerEvent::Document { surface, event } => {
                self.dispatch(surface, |c| c.on_document_changed(&event));
            }
            ControllerEvent::Surface { surface, payload } => {
                match protocol::decode::<SurfaceMessage>(&payload) {
                    Ok(message) => {
                        debug!(%surface, ?message, "surface message");
                        self.dispatch(surface, |c| c.on_surface_message(message));
                    }
                    Err(err) => warn!(%surface, %err, "dropping malformed surface message"),
                }
            }
            ControllerEvent::Disposed(surface) => self.dispose(surface),
            ControllerEvent::Shutdown => {
                for (_, mut controller) in self.views.drain() {
                    controller.dispose();
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Processes events until [`ControllerEvent::Shutdown`] or until every sender is gone.
    pub fn run(mut self, events: Receiver<ControllerEvent>) {
        while let Ok(event) = events.recv() {
            if self.handle(event).is_break() {
                break;
            }
        }
        debug!(remaining = self.views.len(), "controller loop finished");
    }

    fn dispatch(
        &mut self,
        surface: SurfaceId,
        f: impl FnOnce(&mut PreviewController) -> RenderOutcome,
    ) {
        let Some(controller) = self.views.get_mut(&surface) else {
            debug!(%surface, "event for unknown surface");
            return;
        };
        let outcome = f(controller);
        debug!(%surface, ?outcome, "handled");
        if controller.is_disposed() {
            self.views.remove(&surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::surface_channel;
    use crate::document::Workspace;
    use crate::protocol::ControllerMessage;
    use markview_render::MarkdownRenderer;
    use std::fs;
    use std::sync::mpsc;

    struct Fixture {
        dir: tempfile::TempDir,
        workspace: Workspace,
        registry: ViewRegistry,
    }

    fn fixture() -> Fixture {
        let workspace = Workspace::new();
        Fixture {
            dir: tempfile::tempdir().unwrap(),
            registry: ViewRegistry::new(
                Arc::new(workspace.clone()),
                Arc::new(MarkdownRenderer::new()),
            ),
            workspace,
        }
    }

    impl Fixture {
        fn open(&self, name: &str, text: &str) -> Arc<dyn TextDocument> {
            let path = self.dir.path().join(name);
            fs::write(&path, text).unwrap();
            self.workspace.open(path).unwrap()
        }
    }

    #[test]
    fn attach_pushes_first_snapshot() {
        let mut fx = fixture();
        let doc = fx.open("a.md", "# A");
        let (link, mut inbox) = surface_channel();
        let (tx, _rx) = mpsc::channel();

        let outcome = fx
            .registry
            .attach(SurfaceId::next(), doc, Box::new(link), tx)
            .unwrap();

        assert_eq!(outcome, RenderOutcome::Pushed);
        match inbox.drain().as_slice() {
            [ControllerMessage::Update(s)] => assert_eq!(s.html, "<h1>A</h1>\n"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn second_preview_of_same_document_is_rejected() {
        let mut fx = fixture();
        let doc = fx.open("a.md", "x");
        let (tx, _rx) = mpsc::channel();
        let (a, _ia) = surface_channel();
        let (b, _ib) = surface_channel();

        fx.registry
            .attach(SurfaceId::next(), doc.clone(), Box::new(a), tx.clone())
            .unwrap();
        let err = fx
            .registry
            .attach(SurfaceId::next(), doc.clone(), Box::new(b), tx)
            .unwrap_err();
        assert_eq!(err, AttachError::AlreadyOpen(doc.id()));
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn document_changes_are_queued_per_surface() {
        let mut fx = fixture();
        let a = fx.open("a.md", "a");
        let b = fx.open("b.md", "b");
        let (tx, rx) = mpsc::channel();
        let sa = SurfaceId::next();
        let sb = SurfaceId::next();
        let (la, mut ia) = surface_channel();
        let (lb, mut ib) = surface_channel();
        fx.registry.attach(sa, a.clone(), Box::new(la), tx.clone()).unwrap();
        fx.registry.attach(sb, b, Box::new(lb), tx).unwrap();
        ia.drain();
        ib.drain();

        a.replace_all("a2").unwrap();
        while let Ok(event) = rx.try_recv() {
            let _ = fx.registry.handle(event);
        }

        assert_eq!(ia.drain().len(), 1);
        assert!(ib.drain().is_empty());
    }

    #[test]
    fn disposed_surface_is_removed_and_unsubscribed() {
        let mut fx = fixture();
        let doc = fx.open("a.md", "a");
        let (tx, rx) = mpsc::channel();
        let surface = SurfaceId::next();
        let (link, _inbox) = surface_channel();
        fx.registry.attach(surface, doc.clone(), Box::new(link), tx).unwrap();

        let _ = fx.registry.handle(ControllerEvent::Disposed(surface));
        assert!(fx.registry.is_empty());

        doc.replace_all("b").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn malformed_payload_is_dropped() {
        let mut fx = fixture();
        let doc = fx.open("a.md", "a");
        let (tx, _rx) = mpsc::channel();
        let surface = SurfaceId::next();
        let (link, mut inbox) = surface_channel();
        fx.registry.attach(surface, doc, Box::new(link), tx).unwrap();
        inbox.drain();

        let flow = fx.registry.handle(ControllerEvent::Surface {
            surface,
            payload: "{nope".to_string(),
        });
        assert!(flow.is_continue());
        assert!(inbox.drain().is_empty());
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn run_stops_on_shutdown() {
        let fx = fixture();
        let doc = fx.open("a.md", "a");
        let (tx, rx) = mpsc::channel();
        let (link, mut inbox) = surface_channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let surface = SurfaceId::next();
        tx.send(ControllerEvent::Attach {
            surface,
            document: doc,
            sink: Box::new(link),
            notify: tx.clone(),
            reply: reply_tx,
        })
        .unwrap();
        tx.send(ControllerEvent::Surface {
            surface,
            payload: r#"{"type":"toggleMode"}"#.to_string(),
        })
        .unwrap();
        tx.send(ControllerEvent::Shutdown).unwrap();

        fx.registry.run(rx);

        assert_eq!(reply_rx.try_recv().unwrap(), Ok(()));
        let modes: Vec<bool> = inbox
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                ControllerMessage::Update(s) => Some(s.mode.is_edit()),
                ControllerMessage::Unknown => None,
            })
            .collect();
        assert_eq!(modes, vec![false, true]);
        assert!(inbox.is_closed());
    }
}

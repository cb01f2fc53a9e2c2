use std::sync::Arc;

use markview_render::RenderTransform;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::channel::SurfaceSink;
use crate::document::ChangeEvent;
use crate::document::Subscription;
use crate::document::TextDocument;
use crate::protocol::ControllerMessage;
use crate::protocol::RenderSnapshot;
use crate::protocol::SurfaceMessage;
use crate::protocol::ViewMode;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    /// The last snapshot sent to the surface without error. Identical renders are not re-sent.
    pub last_pushed: Option<RenderSnapshot>,
}

/// What a controller operation did, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Pushed,
    /// Rendered, but identical to what the surface already shows.
    Unchanged,
    /// The transform or the surface failed. Nothing was pushed.
    Failed,
    /// Nothing to do: disposed, another document, or an edit awaiting its change notification.
    Skipped,
}

/// Keeps one display surface in sync with one document.
pub struct PreviewController {
    document: Arc<dyn TextDocument>,
    surface: Option<Box<dyn SurfaceSink>>,
    transform: Arc<dyn RenderTransform>,
    state: ViewState,
    subscription: Option<Subscription>,
}

impl PreviewController {
    pub fn new(
        document: Arc<dyn TextDocument>,
        surface: Box<dyn SurfaceSink>,
        transform: Arc<dyn RenderTransform>,
    ) -> Self {
        Self {
            document,
            surface: Some(surface),
            transform,
            state: ViewState::default(),
            subscription: None,
        }
    }

    /// Ties the lifetime of a change-feed registration to this controller.
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    pub fn document(&self) -> &Arc<dyn TextDocument> {
        &self.document
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }

    pub fn on_document_changed(&mut self, event: &ChangeEvent) -> RenderOutcome {
        if event.document != self.document.id() {
            return RenderOutcome::Skipped;
        }
        debug!(document = %event.document, version = event.version, "re-rendering after change");
        self.render()
    }

    pub fn on_surface_message(&mut self, message: SurfaceMessage) -> RenderOutcome {
        if self.is_disposed() {
            return RenderOutcome::Skipped;
        }
        match message {
            SurfaceMessage::ToggleMode => {
                self.state.mode = self.state.mode.toggled();
                debug!(mode = ?self.state.mode, "mode toggled");
                self.render()
            }
            SurfaceMessage::Edit { text } => {
                // The change notification triggers the re-render.
                if let Err(err) = self.document.replace_all(&text) {
                    warn!(document = %self.document.id(), %err, "failed to apply edit");
                }
                RenderOutcome::Skipped
            }
            SurfaceMessage::Unknown => {
                debug!("ignoring unknown surface message");
                RenderOutcome::Skipped
            }
        }
    }

    /// Renders the current text and pushes one full snapshot.
    pub fn render(&mut self) -> RenderOutcome {
        let Some(surface) = self.surface.as_mut() else {
            return RenderOutcome::Skipped;
        };

        let text = self.document.text();
        let html = match self.transform.render(&text) {
            Ok(html) => html,
            Err(err) => {
                warn!(document = %self.document.id(), %err, "render failed, keeping previous view");
                return RenderOutcome::Failed;
            }
        };

        let snapshot = RenderSnapshot {
            html,
            text,
            mode: self.state.mode,
        };
        if self.state.last_pushed.as_ref() == Some(&snapshot) {
            return RenderOutcome::Unchanged;
        }

        match surface.post(&ControllerMessage::Update(snapshot.clone())) {
            Ok(()) => {
                self.state.last_pushed = Some(snapshot);
                RenderOutcome::Pushed
            }
            Err(err) => {
                warn!(document = %self.document.id(), %err, "surface unreachable, disposing");
                self.dispose();
                RenderOutcome::Failed
            }
        }
    }

    /// Stops listening for changes and drops the surface. Idempotent.
    pub fn dispose(&mut self) {
        if self.surface.take().is_some() {
            info!(document = %self.document.id(), "preview disposed");
        }
        self.subscription = None;
    }
}

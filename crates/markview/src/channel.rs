//! The message channel between one controller and its display surface.
//!
//! Both directions carry JSON strings so the surface only ever sees the wire format.
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::sync::mpsc::TryRecvError;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::protocol;
use crate::protocol::ControllerMessage;
use crate::protocol::ProtocolError;
use crate::protocol::SurfaceMessage;
use crate::registry::ControllerEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("the other side of the channel is gone")]
    Disconnected,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Where a controller posts its messages.
pub trait SurfaceSink: Send {
    fn post(&mut self, message: &ControllerMessage) -> Result<(), ChannelError>;
}

/// Controller → surface half.
#[derive(Clone, Debug)]
pub struct SurfaceLink {
    tx: Sender<String>,
}

impl SurfaceSink for SurfaceLink {
    fn post(&mut self, message: &ControllerMessage) -> Result<(), ChannelError> {
        let payload = protocol::encode(message)?;
        self.tx
            .send(payload)
            .map_err(|_| ChannelError::Disconnected)
    }
}

/// Receiving end on the surface side.
#[derive(Debug)]
pub struct SurfaceInbox {
    rx: Receiver<String>,
    closed: bool,
}

impl SurfaceInbox {
    /// Decodes everything queued so far without blocking. Malformed payloads are logged and
    /// skipped; unknown message types come back as [`ControllerMessage::Unknown`].
    pub fn drain(&mut self) -> Vec<ControllerMessage> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(payload) => match protocol::decode::<ControllerMessage>(&payload) {
                    Ok(message) => out.push(message),
                    Err(err) => warn!(%err, "dropping malformed controller message"),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        debug!("controller side closed");
                    }
                    self.closed = true;
                    break;
                }
            }
        }
        out
    }

    /// Whether the controller hung up. Only updated by [`SurfaceInbox::drain`].
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

pub fn surface_channel() -> (SurfaceLink, SurfaceInbox) {
    let (tx, rx) = mpsc::channel();
    (SurfaceLink { tx }, SurfaceInbox { rx, closed: false })
}

/// Surface → controller half. Every post is tagged with the surface it came from.
#[derive(Clone, Debug)]
pub struct ControllerLink {
    surface: SurfaceId,
    tx: Sender<ControllerEvent>,
}

impl ControllerLink {
    pub fn new(surface: SurfaceId, tx: Sender<ControllerEvent>) -> Self {
        Self { surface, tx }
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn post(&self, message: &SurfaceMessage) -> Result<(), ChannelError> {
        let payload = protocol::encode(message)?;
        self.send(ControllerEvent::Surface {
            surface: self.surface,
            payload,
        })
    }

    /// Tells the controller this surface is gone.
    pub fn dispose(&self) -> Result<(), ChannelError> {
        self.send(ControllerEvent::Disposed(self.surface))
    }

    fn send(&self, event: ControllerEvent) -> Result<(), ChannelError> {
        self.tx.send(event).map_err(|_| ChannelError::Disconnected)
    }
}

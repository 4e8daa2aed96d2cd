//! Non-owning control registry and owner-thread dispatch.
//!
//! Native callbacks never hold the editor control. They hold a
//! [`SurfaceLink`] (a [`SurfaceId`] plus the registry) and resolve the
//! control's [`Dispatcher`] on every delivery. A dropped control leaves no
//! live entry, so late messages are discarded.
//!
//! ```text
//! native thread                    owner loop
//! ─────────────                    ──────────
//! SurfaceLink::on_message ──┐
//!   registry.lookup(id)     │  mpsc   ┌──────────────────┐
//!   dispatcher.post(..) ────┴────────►│ SurfaceEvent     │
//!                                     │  Navigated       │
//! SurfaceLink::navigated ────────────►│  Message(String) │
//!                                     │  Load { .. }     │
//!                                     └──────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::SurfaceId;

use super::MessageTransport;

// ============================================================================
// SurfaceEvent
// ============================================================================

/// Work item processed by a control's owner loop.
pub(crate) enum SurfaceEvent {
    /// The surface finished loading its content.
    Navigated,
    /// The surface pushed a string message.
    Message(String),
    /// Replace the surface content, re-arming readiness first.
    Load {
        html: String,
        done: oneshot::Sender<Result<()>>,
    },
}

impl fmt::Debug for SurfaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigated => f.write_str("Navigated"),
            Self::Message(payload) => f
                .debug_struct("Message")
                .field("len", &payload.len())
                .finish(),
            Self::Load { html, .. } => f
                .debug_struct("Load")
                .field("html_len", &html.len())
                .finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Sending half of a control's owner loop.
///
/// Owned by the editor control; the registry only keeps a weak reference.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    surface_id: SurfaceId,
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiver its owner loop drains.
    pub(crate) fn new(
        surface_id: SurfaceId,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { surface_id, tx }), rx)
    }

    /// Queues an event for the owner loop.
    ///
    /// Returns `false` if the loop has already stopped.
    pub(crate) fn post(&self, event: SurfaceEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!(surface_id = %self.surface_id, event = ?e.0, "Owner loop stopped, event dropped");
                false
            }
        }
    }
}

// ============================================================================
// ControlRegistry
// ============================================================================

/// Relation table from surface IDs to live controls.
///
/// Entries are weak: the table never keeps a control alive. Share one
/// registry between all controls of an application, or let each control
/// create its own.
#[derive(Default)]
pub struct ControlRegistry {
    controls: RwLock<FxHashMap<SurfaceId, Weak<Dispatcher>>>,
}

impl fmt::Debug for ControlRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl ControlRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a control's dispatcher, replacing any previous entry.
    pub(crate) fn register(&self, surface_id: SurfaceId, dispatcher: &Arc<Dispatcher>) {
        let previous = self
            .controls
            .write()
            .insert(surface_id, Arc::downgrade(dispatcher));
        debug!(%surface_id, replaced = previous.is_some(), "Control registered");
    }

    /// Removes a control's entry.
    pub(crate) fn unregister(&self, surface_id: SurfaceId) {
        if self.controls.write().remove(&surface_id).is_some() {
            debug!(%surface_id, "Control unregistered");
        }
    }

    /// Resolves a live dispatcher.
    ///
    /// Stale entries (control dropped without unregistering) are pruned.
    pub(crate) fn lookup(&self, surface_id: SurfaceId) -> Option<Arc<Dispatcher>> {
        let weak = self.controls.read().get(&surface_id).cloned()?;
        match weak.upgrade() {
            Some(dispatcher) => Some(dispatcher),
            None => {
                self.controls.write().remove(&surface_id);
                trace!(%surface_id, "Pruned stale control entry");
                None
            }
        }
    }

    /// Returns `true` if a live control is registered under `surface_id`.
    #[must_use]
    pub fn contains(&self, surface_id: SurfaceId) -> bool {
        self.lookup(surface_id).is_some()
    }

    /// Returns the number of entries, including not-yet-pruned stale ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.read().len()
    }

    /// Returns `true` if the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SurfaceLink
// ============================================================================

/// Non-owning handle native code uses to notify a control.
///
/// Pass it to the platform adapters as their [`MessageTransport`], and call
/// [`navigated`](Self::navigated) from the renderer's load-completed
/// callback. Safe to call from any thread; delivery happens on the control's
/// owner loop.
#[derive(Clone)]
pub struct SurfaceLink {
    surface_id: SurfaceId,
    registry: Arc<ControlRegistry>,
}

impl fmt::Debug for SurfaceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceLink")
            .field("surface_id", &self.surface_id)
            .finish_non_exhaustive()
    }
}

impl SurfaceLink {
    /// Creates a link to the control registered under `surface_id`.
    #[must_use]
    pub fn new(surface_id: SurfaceId, registry: Arc<ControlRegistry>) -> Self {
        Self {
            surface_id,
            registry,
        }
    }

    /// Returns the linked surface ID.
    #[inline]
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Reports that the surface finished loading its content.
    pub fn navigated(&self) {
        self.deliver(SurfaceEvent::Navigated);
    }

    /// Returns `true` if the linked control is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.registry.contains(self.surface_id)
    }

    fn deliver(&self, event: SurfaceEvent) {
        match self.registry.lookup(self.surface_id) {
            Some(dispatcher) => {
                dispatcher.post(event);
            }
            None => {
                trace!(surface_id = %self.surface_id, ?event, "Control gone, event dropped");
            }
        }
    }
}

impl MessageTransport for SurfaceLink {
    fn on_message(&self, payload: String) {
        trace!(surface_id = %self.surface_id, len = payload.len(), "Inbound message");
        self.deliver(SurfaceEvent::Message(payload));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_live_control() {
        let registry = ControlRegistry::new();
        let id = SurfaceId::generate();
        let (dispatcher, _rx) = Dispatcher::new(id);

        registry.register(id, &dispatcher);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        registry.unregister(id);
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_does_not_keep_control_alive() {
        let registry = ControlRegistry::new();
        let id = SurfaceId::generate();
        let (dispatcher, _rx) = Dispatcher::new(id);
        registry.register(id, &dispatcher);

        drop(dispatcher);

        assert!(registry.lookup(id).is_none());
        assert!(registry.is_empty(), "stale entry should be pruned");
    }

    #[test]
    fn test_link_forwards_to_owner_loop() {
        let registry = ControlRegistry::new();
        let id = SurfaceId::generate();
        let (dispatcher, mut rx) = Dispatcher::new(id);
        registry.register(id, &dispatcher);

        let link = SurfaceLink::new(id, Arc::clone(&registry));
        link.on_message("hello".to_string());
        link.navigated();

        assert!(matches!(rx.try_recv(), Ok(SurfaceEvent::Message(m)) if m == "hello"));
        assert!(matches!(rx.try_recv(), Ok(SurfaceEvent::Navigated)));
    }

    #[test]
    fn test_link_to_dropped_control_is_silent() {
        let registry = ControlRegistry::new();
        let id = SurfaceId::generate();
        let (dispatcher, rx) = Dispatcher::new(id);
        registry.register(id, &dispatcher);
        let link = SurfaceLink::new(id, Arc::clone(&registry));

        drop(dispatcher);
        drop(rx);

        assert!(!link.is_alive());
        link.on_message("late".to_string());
        link.navigated();
    }

    #[test]
    fn test_link_from_other_thread() {
        let registry = ControlRegistry::new();
        let id = SurfaceId::generate();
        let (dispatcher, mut rx) = Dispatcher::new(id);
        registry.register(id, &dispatcher);
        let link = SurfaceLink::new(id, Arc::clone(&registry));

        std::thread::spawn(move || link.on_message("from native".to_string()))
            .join()
            .expect("join");

        assert!(matches!(rx.try_recv(), Ok(SurfaceEvent::Message(m)) if m == "from native"));
    }
}

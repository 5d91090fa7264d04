//! Floating panel positioning.
//!
//! The engine that keeps a dropdown glued to its combo box (flipping,
//! clipping, scrolling) belongs to the host. Widgets only see it through
//! [`PositioningService`], which creates one [`FloatingPanel`] per anchor
//! parent and reports clicks outside the panel through an
//! [`OutsideClickNotifier`].

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use horizon_ux_core::logging::targets;

/// Host identifier of a node in the widget tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// A positioned panel created by a [`PositioningService`].
pub trait FloatingPanel: Send {
    /// Recompute the panel position.
    fn update(&mut self);

    /// Release the panel. Called exactly once.
    fn destroy(&mut self);
}

/// Creates floating panels anchored under a parent node.
pub trait PositioningService: Send + Sync {
    /// Create a panel for a widget whose root lives under `parent`.
    fn create(&self, parent: Option<NodeId>, outside_click: OutsideClickNotifier)
    -> Box<dyn FloatingPanel>;
}

/// Marker sent when the user clicked outside a floating panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutsideClick;

/// Handle a [`FloatingPanel`] uses to report outside clicks to its widget.
#[derive(Debug, Clone)]
pub struct OutsideClickNotifier {
    sender: Sender<OutsideClick>,
}

impl OutsideClickNotifier {
    /// Create a notifier feeding `sender`.
    pub fn new(sender: Sender<OutsideClick>) -> Self {
        Self { sender }
    }

    /// Report an outside click. Returns `false` if the widget is gone.
    pub fn notify(&self) -> bool {
        self.sender.send(OutsideClick).is_ok()
    }
}

// ============================================================================
// Detached Positioning
// ============================================================================

/// A service whose panels never move. Useful for hosts that lay dropdowns
/// out themselves, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedPositioning;

impl PositioningService for DetachedPositioning {
    fn create(
        &self,
        _parent: Option<NodeId>,
        _outside_click: OutsideClickNotifier,
    ) -> Box<dyn FloatingPanel> {
        Box::new(DetachedPanel)
    }
}

struct DetachedPanel;

impl FloatingPanel for DetachedPanel {
    fn update(&mut self) {}

    fn destroy(&mut self) {}
}

// ============================================================================
// Adapter
// ============================================================================

/// Owns the one live floating panel of a widget and recreates it when the
/// widget moves to another parent.
pub struct PositioningAdapter {
    service: Arc<dyn PositioningService>,
    panel: Option<Box<dyn FloatingPanel>>,
    parent: Option<NodeId>,
    notifier: OutsideClickNotifier,
}

impl PositioningAdapter {
    /// Create the adapter and its first panel, anchored under `parent`.
    pub fn new(
        service: Arc<dyn PositioningService>,
        parent: Option<NodeId>,
        notifier: OutsideClickNotifier,
    ) -> Self {
        let panel = service.create(parent, notifier.clone());
        tracing::trace!(target: targets::POSITIONING, ?parent, "floating panel created");
        Self {
            service,
            panel: Some(panel),
            parent,
            notifier,
        }
    }

    /// The parent the live panel was created for.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether a panel is live.
    pub fn is_active(&self) -> bool {
        self.panel.is_some()
    }

    /// Make sure the live panel belongs to `parent`, destroying the old
    /// panel before creating the new one. Returns whether a new panel was
    /// created.
    pub fn ensure_anchored(&mut self, parent: Option<NodeId>) -> bool {
        if self.panel.is_some() && self.parent == parent {
            return false;
        }
        self.destroy();
        self.panel = Some(self.service.create(parent, self.notifier.clone()));
        tracing::debug!(
            target: targets::POSITIONING,
            old_parent = ?self.parent,
            new_parent = ?parent,
            "floating panel re-anchored"
        );
        self.parent = parent;
        true
    }

    /// Recompute the panel position.
    pub fn update(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            panel.update();
        }
    }

    /// Destroy the live panel, if any.
    pub fn destroy(&mut self) {
        if let Some(mut panel) = self.panel.take() {
            panel.destroy();
            tracing::trace!(target: targets::POSITIONING, parent = ?self.parent, "floating panel destroyed");
        }
    }
}

impl fmt::Debug for PositioningAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositioningAdapter")
            .field("parent", &self.parent)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl Drop for PositioningAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Create(Option<NodeId>),
        Update(Option<NodeId>),
        Destroy(Option<NodeId>),
    }

    #[derive(Default)]
    struct RecordingService {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    struct RecordingPanel {
        parent: Option<NodeId>,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl PositioningService for RecordingService {
        fn create(
            &self,
            parent: Option<NodeId>,
            _outside_click: OutsideClickNotifier,
        ) -> Box<dyn FloatingPanel> {
            self.calls.lock().push(Call::Create(parent));
            Box::new(RecordingPanel {
                parent,
                calls: Arc::clone(&self.calls),
            })
        }
    }

    impl FloatingPanel for RecordingPanel {
        fn update(&mut self) {
            self.calls.lock().push(Call::Update(self.parent));
        }

        fn destroy(&mut self) {
            self.calls.lock().push(Call::Destroy(self.parent));
        }
    }

    fn adapter() -> (PositioningAdapter, Arc<Mutex<Vec<Call>>>) {
        let service = RecordingService::default();
        let calls = Arc::clone(&service.calls);
        let (tx, _rx) = crossbeam_channel::unbounded();
        let adapter = PositioningAdapter::new(Arc::new(service), None, OutsideClickNotifier::new(tx));
        (adapter, calls)
    }

    #[test]
    fn test_reanchor_destroys_before_create() {
        let (mut adapter, calls) = adapter();
        assert!(!adapter.ensure_anchored(None));
        assert!(adapter.ensure_anchored(Some(NodeId(7))));
        assert!(!adapter.ensure_anchored(Some(NodeId(7))));
        adapter.update();

        assert_eq!(
            *calls.lock(),
            vec![
                Call::Create(None),
                Call::Destroy(None),
                Call::Create(Some(NodeId(7))),
                Call::Update(Some(NodeId(7))),
            ]
        );
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (mut adapter, calls) = adapter();
        adapter.destroy();
        adapter.destroy();
        adapter.update();
        assert!(!adapter.is_active());
        drop(adapter);
        assert_eq!(*calls.lock(), vec![Call::Create(None), Call::Destroy(None)]);
    }

    #[test]
    fn test_outside_click_notifier() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let notifier = OutsideClickNotifier::new(tx);
        assert!(notifier.notify());
        assert_eq!(rx.try_recv(), Ok(OutsideClick));
        drop(rx);
        assert!(!notifier.notify());
    }
}

//! Signal/slot primitive for Horizon Composite.
//!
//! A [`Signal<Args>`] holds a set of connected slots (closures) and invokes
//! all of them when emitted. Everything runs on the page's single thread, so
//! every connection is direct.
//!
//! Slots are snapshotted before invocation: a slot may connect or disconnect
//! other slots (or itself) while the signal is being emitted. The change
//! takes effect from the next emission.
//!
//! # Example
//!
//! ```
//! use horizon_composite_core::Signal;
//!
//! let expanded_changed = Signal::<bool>::new();
//! let id = expanded_changed.connect(|open| println!("expanded: {open}"));
//! expanded_changed.emit(&true);
//! expanded_changed.disconnect(id);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot (closure) to this signal.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Emit the signal, invoking every slot connected at the time of the
    /// call in connection order.
    pub fn emit(&self, args: &Args) {
        // Release the lock before invoking so slots may reconnect.
        let snapshot: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        for slot in snapshot {
            slot(args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_all_slots() {
        let signal = Signal::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let total = total.clone();
            signal.connect(move |n| {
                total.fetch_add(*n as usize, Ordering::SeqCst);
            });
        }

        signal.emit(&2);
        assert_eq!(total.load(Ordering::SeqCst), 6);
        assert_eq!(signal.connection_count(), 3);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_connect_and_disconnect() {
        let signal = Arc::new(Signal::<()>::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_signal = signal.clone();
        let inner_hits = hits.clone();
        signal.connect(move |_| {
            let hits = inner_hits.clone();
            inner_signal.connect(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        });

        // The slot added during emission does not run in the same emission.
        signal.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(signal.connection_count(), 2);

        signal.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let self_removing = signal.clone();
        let slot_id = Arc::new(Mutex::new(None::<ConnectionId>));
        let slot_id_inner = slot_id.clone();
        let id = signal.connect(move |_| {
            if let Some(id) = *slot_id_inner.lock() {
                self_removing.disconnect(id);
            }
        });
        *slot_id.lock() = Some(id);
        signal.emit(&());
        assert!(!signal.disconnect(id));
    }
}

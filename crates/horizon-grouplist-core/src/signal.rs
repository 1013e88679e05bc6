//! Change notification between models and their observers.
//!
//! A [`Signal`] holds a list of slots (callbacks). Models own one signal per
//! kind of change (rows inserted, data changed, reset, ...) and emit it after
//! mutating; views and dependent models connect slots to follow along.
//!
//! # Invocation
//!
//! The grouping models run on a single logical thread (the host's UI thread),
//! so every slot is invoked directly, in the emitting thread, before `emit`
//! returns. Slots run in the order they were connected. The slot list is
//! snapshotted before invocation: a slot may connect or disconnect slots
//! (including itself) on the same signal without deadlocking, and such
//! changes take effect from the next emission.
//!
//! # Example
//!
//! ```
//! use horizon_grouplist_core::Signal;
//!
//! // Rows `first..=last` were inserted.
//! let rows_inserted = Signal::<(usize, usize)>::new();
//!
//! let id = rows_inserted.connect(|(first, last)| {
//!     println!("rows {first}..={last} inserted");
//! });
//!
//! rows_inserted.emit((3, 5));
//! rows_inserted.disconnect(id);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Identifies one slot connected to a [`Signal`].
    ///
    /// Pass it to [`Signal::disconnect`] to remove the slot. Ids are never
    /// reused by the signal that issued them.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connections<Args> {
    slots: SlotMap<ConnectionId, Slot<Args>>,
    /// Connection order; slot map iteration order is not stable across removals.
    order: Vec<ConnectionId>,
}

impl<Args> Connections<Args> {
    fn snapshot(&self) -> Vec<Slot<Args>> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(*id).cloned())
            .collect()
    }
}

/// A notification with any number of connected slots.
///
/// `Args` is what the emitter hands to every slot, by reference. Use `()`
/// for plain notifications and tuples for several values, e.g.
/// `Signal<(usize, usize)>` for a row range.
pub struct Signal<Args> {
    connections: Mutex<Connections<Args>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().slots.len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Creates a signal with no slots.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                slots: SlotMap::with_key(),
                order: Vec::new(),
            }),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connects a slot, returning the id to disconnect it with.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let id = connections.slots.insert(Arc::new(slot));
        connections.order.push(id);
        id
    }

    /// Disconnects one slot.
    ///
    /// Returns `false` if the id is unknown or already disconnected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        if connections.slots.remove(id).is_none() {
            return false;
        }
        connections.order.retain(|other| *other != id);
        true
    }

    /// Disconnects every slot.
    pub fn disconnect_all(&self) {
        let mut connections = self.connections.lock();
        connections.slots.clear();
        connections.order.clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Blocks or unblocks emission. A blocked signal drops every `emit`.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Invokes every connected slot with `args`, in connection order.
    #[tracing::instrument(skip_all, target = "horizon_grouplist_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "blocked, emission dropped");
            return;
        }

        let slots = self.connections.lock().snapshot();
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emit");
        for slot in slots {
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn recorder<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        signal.connect(move |args: &T| sink.lock().push(args.clone()));
        log
    }

    #[test]
    fn test_emit_reaches_slot() {
        let rows_removed = Signal::<(usize, usize)>::new();
        let log = recorder(&rows_removed);

        rows_removed.emit((0, 2));
        rows_removed.emit((7, 7));

        assert_eq!(*log.lock(), vec![(0, 2), (7, 7)]);
    }

    #[test]
    fn test_disconnect() {
        let reset = Signal::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let id = reset.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        reset.emit(());
        assert!(reset.disconnect(id));
        assert!(!reset.disconnect(id));
        reset.emit(());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(reset.connection_count(), 0);
    }

    #[test]
    fn test_blocked_signal_drops_emissions() {
        let changed = Signal::<usize>::new();
        let log = recorder(&changed);

        changed.emit(1);
        changed.set_blocked(true);
        assert!(changed.is_blocked());
        changed.emit(2);
        changed.set_blocked(false);
        changed.emit(3);

        assert_eq!(*log.lock(), vec![1, 3]);
    }

    #[test]
    fn test_connection_order_survives_disconnect() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut ids = Vec::new();

        for tag in ["view", "proxy", "header"] {
            let order = order.clone();
            ids.push(signal.connect(move |_| order.lock().push(tag)));
        }
        signal.disconnect(ids[0]);
        // Reuses the freed slot map entry.
        let late = order.clone();
        signal.connect(move |_| late.lock().push("status"));

        signal.emit(());
        assert_eq!(*order.lock(), vec!["proxy", "header", "status"]);

        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_slot_connecting_during_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&signal);
        let inner_hits = hits.clone();
        signal.connect(move |_| {
            if let Some(signal) = weak.upgrade() {
                let hits = inner_hits.clone();
                signal.connect(move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        // The slot added during emission only runs from the next emit on.
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(signal.connection_count(), 2);

        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_disconnecting_itself() {
        let signal = Arc::new(Signal::<()>::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&signal);
        let counter = hits.clone();
        let slot_id = own_id.clone();
        let id = signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let (Some(signal), Some(id)) = (weak.upgrade(), *slot_id.lock()) {
                signal.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(());
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

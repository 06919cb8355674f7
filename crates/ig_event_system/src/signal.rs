/// Signal/slot implementation
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Identity of a subscriber.
///
/// Every object that connects to signals owns one `ReceiverId`. The same
/// receiver may connect to many signals (or several times to the same
/// signal); the id lets it later drop exactly the subscriptions it made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(u64);

impl ReceiverId {
    /// Allocates a process-unique receiver id.
    pub fn new() -> Self {
        static NEXT_RECEIVER: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_RECEIVER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value, mostly useful for logging.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for ReceiverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "receiver#{}", self.0)
    }
}

/// Handle of one connection on one signal.
///
/// Slot ids are only unique within the signal that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

type Callback<A> = Rc<dyn Fn(&A)>;

struct SlotEntry<A> {
    id: SlotId,
    receiver: ReceiverId,
    live: Rc<Cell<bool>>,
    callback: Callback<A>,
}

/// A typed, single-threaded, synchronous one-to-many notification channel.
///
/// Slots are invoked in connection order. Emission works on a snapshot of the
/// slot list, so a slot may freely connect, disconnect or emit again on the
/// same signal:
///
/// - a slot disconnected during an emission is not invoked later in that
///   same emission,
/// - a slot connected during an emission is first invoked by the next one.
///
/// No internal borrow is held while user callbacks run.
///
/// # Examples
///
/// ```rust
/// use ig_event_system::{ReceiverId, Signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let signal: Signal<u32> = Signal::new();
/// let total = Rc::new(Cell::new(0));
/// let sink = total.clone();
/// let receiver = ReceiverId::new();
///
/// signal.connect(receiver, move |value| sink.set(sink.get() + *value));
/// signal.emit(&5);
/// signal.emit(&7);
/// assert_eq!(total.get(), 12);
///
/// signal.disconnect_receiver(receiver);
/// signal.emit(&100);
/// assert_eq!(total.get(), 12);
/// ```
pub struct Signal<A> {
    slots: RefCell<SmallVec<[SlotEntry<A>; 4]>>,
    next_slot: Cell<u64>,
}

impl<A> Signal<A> {
    /// Creates a signal with no connected slots.
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(SmallVec::new()),
            next_slot: Cell::new(1),
        }
    }

    /// Connects `slot` on behalf of `receiver`.
    ///
    /// # Returns
    ///
    /// The id of the new connection, to be used with [`Signal::disconnect`].
    pub fn connect<F>(&self, receiver: ReceiverId, slot: F) -> SlotId
    where
        F: Fn(&A) + 'static,
    {
        let id = SlotId(self.next_slot.get());
        self.next_slot.set(id.0 + 1);
        self.slots.borrow_mut().push(SlotEntry {
            id,
            receiver,
            live: Rc::new(Cell::new(true)),
            callback: Rc::new(slot),
        });
        trace!("🔗 Connected slot {:?} for {}", id, receiver);
        id
    }

    /// Removes one connection made by `receiver`.
    ///
    /// Both the receiver and the slot id must match, so a receiver can never
    /// drop another subscriber's connection by accident.
    ///
    /// # Returns
    ///
    /// `true` if a connection was removed.
    pub fn disconnect(&self, receiver: ReceiverId, slot: SlotId) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots
            .iter()
            .position(|entry| entry.id == slot && entry.receiver == receiver)
        {
            Some(index) => {
                let entry = slots.remove(index);
                entry.live.set(false);
                true
            }
            None => false,
        }
    }

    /// Removes every connection made by `receiver`.
    ///
    /// # Returns
    ///
    /// The number of connections removed.
    pub fn disconnect_receiver(&self, receiver: ReceiverId) -> usize {
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|entry| {
            if entry.receiver == receiver {
                entry.live.set(false);
                false
            } else {
                true
            }
        });
        before - slots.len()
    }

    /// Removes every connection.
    pub fn disconnect_all(&self) {
        for entry in self.slots.borrow_mut().drain(..) {
            entry.live.set(false);
        }
    }

    /// Returns whether `receiver` holds at least one connection.
    pub fn is_connected(&self, receiver: ReceiverId) -> bool {
        self.slots
            .borrow()
            .iter()
            .any(|entry| entry.receiver == receiver)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Invokes every connected slot with `args`, in connection order.
    pub fn emit(&self, args: &A) {
        let snapshot: SmallVec<[(Rc<Cell<bool>>, Callback<A>); 4]> = self
            .slots
            .borrow()
            .iter()
            .map(|entry| (entry.live.clone(), entry.callback.clone()))
            .collect();

        for (live, callback) in snapshot {
            if live.get() {
                callback(args);
            }
        }
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slot_count())
            .finish()
    }
}
